use crate::error::Result;
use crate::models::{Coordinates, PlaceResult};
use async_trait::async_trait;

/// Free-text place search bounded around a point.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        center: &Coordinates,
        radius_m: f64,
    ) -> Result<Vec<PlaceResult>>;
}
