use crate::cache::{geocode_cache_key, reverse_geocode_cache_key, GeocodeCache};
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates>;
    async fn reverse_geocode(&self, point: &Coordinates) -> Result<String>;
}

/// Read-through cache in front of a geocoder. Cache failures degrade to a
/// direct lookup, never to an error.
#[derive(Clone)]
pub struct CachedGeocoder {
    inner: Arc<dyn Geocoder>,
    cache: Arc<dyn GeocodeCache>,
}

impl CachedGeocoder {
    pub fn new(inner: Arc<dyn Geocoder>, cache: Arc<dyn GeocodeCache>) -> Self {
        CachedGeocoder { inner, cache }
    }
}

#[async_trait]
impl Geocoder for CachedGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates> {
        if address.trim().is_empty() {
            return Err(AppError::InvalidRequest("Address must not be empty".to_string()));
        }

        let key = geocode_cache_key(address);
        if let Some(point) = self.cache.get_cached_point(&key).await {
            return Ok(point);
        }

        let point = self.inner.geocode(address).await?;
        self.cache.cache_point(&key, &point).await;
        Ok(point)
    }

    async fn reverse_geocode(&self, point: &Coordinates) -> Result<String> {
        point.validate()?;

        let key = reverse_geocode_cache_key(point);
        if let Some(address) = self.cache.get_cached_address(&key).await {
            return Ok(address);
        }

        let address = self.inner.reverse_geocode(point).await?;
        self.cache.cache_address(&key, &address).await;
        Ok(address)
    }
}
