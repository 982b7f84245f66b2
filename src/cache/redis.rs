use crate::cache::{CacheStats, GeocodeCache};
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis-backed geocode cache. `ConnectionManager` is `Arc`-based internally,
/// so each call clones it instead of locking.
pub struct RedisCacheService {
    connection: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisCacheService {
    pub async fn new(redis_url: &str, ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Redis cache connection established");

        Ok(RedisCacheService {
            connection,
            ttl_seconds,
        })
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<Option<String>> = conn.get(key).await;

        match result {
            Ok(Some(value)) => {
                tracing::debug!("Cache hit: {}", key);
                Some(value)
            }
            Ok(None) => {
                tracing::debug!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Redis error getting {}: {}", key, e);
                None
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String) {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = conn.set_ex(key, value, self.ttl_seconds).await;

        match result {
            Ok(()) => {
                tracing::debug!("Cached with TTL {}s: {}", self.ttl_seconds, key);
            }
            Err(e) => {
                tracing::warn!("Failed to cache {}: {}", key, e);
            }
        }
    }
}

#[async_trait]
impl GeocodeCache for RedisCacheService {
    async fn get_cached_point(&self, key: &str) -> Option<Coordinates> {
        let json = self.get_raw(key).await?;
        match serde_json::from_str(&json) {
            Ok(point) => Some(point),
            Err(e) => {
                tracing::warn!("Failed to deserialize cached point: {}", e);
                None
            }
        }
    }

    async fn cache_point(&self, key: &str, point: &Coordinates) {
        let json = match serde_json::to_string(point) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize point for cache: {}", e);
                return;
            }
        };
        self.set_raw(key, json).await;
    }

    async fn get_cached_address(&self, key: &str) -> Option<String> {
        self.get_raw(key).await
    }

    async fn cache_address(&self, key: &str, address: &str) {
        self.set_raw(key, address.to_string()).await;
    }

    async fn get_stats(&self) -> CacheStats {
        let mut conn = self.connection.clone();
        let info: redis::RedisResult<String> =
            redis::cmd("INFO").arg("stats").query_async(&mut conn).await;

        match info {
            Ok(info_str) => CacheStats::from_counts(
                parse_info_value(&info_str, "keyspace_hits"),
                parse_info_value(&info_str, "keyspace_misses"),
                true,
            ),
            Err(_) => CacheStats::from_counts(0, 0, false),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

fn parse_info_value(info: &str, key: &str) -> u64 {
    info.lines()
        .find(|line| line.starts_with(key))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|val| val.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_value() {
        let info = "# Stats\r\nkeyspace_hits:42\r\nkeyspace_misses:7\r\n";
        assert_eq!(parse_info_value(info, "keyspace_hits"), 42);
        assert_eq!(parse_info_value(info, "keyspace_misses"), 7);
        assert_eq!(parse_info_value(info, "evicted_keys"), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_is_cache_error() {
        let result = RedisCacheService::new("not-a-redis-url", 60).await;
        assert!(matches!(result, Err(AppError::Cache(_))));
    }
}
