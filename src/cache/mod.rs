pub mod memory;
pub mod redis;

pub use memory::MemoryCacheService;
pub use redis::RedisCacheService;

use crate::constants::REVERSE_GEOCODE_KEY_PRECISION;
use crate::models::Coordinates;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Geocode result cache shared across requests. Misses and backend errors
/// both come back as `None`; callers then ask the geocoder directly.
#[async_trait]
pub trait GeocodeCache: Send + Sync {
    async fn get_cached_point(&self, key: &str) -> Option<Coordinates>;
    async fn cache_point(&self, key: &str, point: &Coordinates);
    async fn get_cached_address(&self, key: &str) -> Option<String>;
    async fn cache_address(&self, key: &str, address: &str);
    async fn get_stats(&self) -> CacheStats;
    async fn health_check(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Forward-geocode key. Addresses differing only in case or spacing share an entry.
pub fn geocode_cache_key(address: &str) -> String {
    let normalized = address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("geocode:fwd:{}", normalized)
}

/// Reverse-geocode key on the point rounded to ~1 m.
pub fn reverse_geocode_cache_key(point: &Coordinates) -> String {
    let rounded = point.round(REVERSE_GEOCODE_KEY_PRECISION);
    format!("geocode:rev:{:.5},{:.5}", rounded.lat, rounded.lng)
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub connected: bool,
}

impl CacheStats {
    pub fn from_counts(hits: u64, misses: u64, connected: bool) -> Self {
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            connected,
        }
    }
}
