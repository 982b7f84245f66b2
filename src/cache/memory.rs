use crate::cache::{CacheStats, GeocodeCache};
use crate::models::Coordinates;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// In-memory geocode cache backed by moka with TTL and bounded capacity.
/// All methods are `&self`, no locking needed.
pub struct MemoryCacheService {
    points: Cache<String, Coordinates>,
    addresses: Cache<String, String>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCacheService {
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let points = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();
        let addresses = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        MemoryCacheService {
            points,
            addresses,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn record<T>(&self, key: &str, value: Option<T>) -> Option<T> {
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Memory cache hit: {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Memory cache miss: {}", key);
        }
        value
    }
}

#[async_trait]
impl GeocodeCache for MemoryCacheService {
    async fn get_cached_point(&self, key: &str) -> Option<Coordinates> {
        let value = self.points.get(key).await;
        self.record(key, value)
    }

    async fn cache_point(&self, key: &str, point: &Coordinates) {
        self.points.insert(key.to_string(), *point).await;
        tracing::debug!("Memory cached point: {}", key);
    }

    async fn get_cached_address(&self, key: &str) -> Option<String> {
        let value = self.addresses.get(key).await;
        self.record(key, value)
    }

    async fn cache_address(&self, key: &str, address: &str) {
        self.addresses
            .insert(key.to_string(), address.to_string())
            .await;
        tracing::debug!("Memory cached address: {}", key);
    }

    async fn get_stats(&self) -> CacheStats {
        CacheStats::from_counts(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            true,
        )
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
