// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

// App state for sharing across the application
use cache::GeocodeCache;
use services::geocoding::CachedGeocoder;
use services::route_generator::RouteGenerator;
use std::sync::Arc;

pub struct AppState {
    pub route_generator: RouteGenerator,
    pub geocoder: CachedGeocoder,
    pub cache: Arc<dyn GeocodeCache>,
}
