use async_trait::async_trait;
use routeplanner::config::RouteGeneratorConfig;
use routeplanner::error::{AppError, Result};
use routeplanner::models::{Coordinates, PlaceResult, TransportMode};
use routeplanner::services::geocoding::Geocoder;
use routeplanner::services::place_search::PlaceSearch;
use routeplanner::services::poi_service::PoiService;
use routeplanner::services::route_generator::geometry;
use routeplanner::services::route_generator::RouteGenerator;
use routeplanner::services::routing::{RoutedPath, RoutingEngine};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Deterministic stand-in for a routing engine: the routed length is the
/// straight-segment length of the point list times `road_factor`.
#[allow(dead_code)]
pub struct SimulatedRoutingEngine {
    pub road_factor: f64,
    /// Zero-based call numbers that fail with a transport error.
    pub failing_calls: Vec<usize>,
    /// Cancelled when the given call number starts.
    pub cancel_on_call: Option<(usize, CancellationToken)>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<Coordinates>>>,
}

#[allow(dead_code)]
impl SimulatedRoutingEngine {
    pub fn new(road_factor: f64) -> Self {
        SimulatedRoutingEngine {
            road_factor,
            failing_calls: Vec::new(),
            cancel_on_call: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.failing_calls = calls.to_vec();
        self
    }

    pub fn cancelling_on(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_on_call = Some((call, token));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Vec<Coordinates>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutingEngine for SimulatedRoutingEngine {
    async fn compute_route(
        &self,
        points: &[Coordinates],
        mode: &TransportMode,
    ) -> Result<RoutedPath> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(points.to_vec());

        if let Some((when, token)) = &self.cancel_on_call {
            if *when == call {
                token.cancel();
            }
        }
        if self.failing_calls.contains(&call) {
            return Err(AppError::Routing("simulated HTTP 503".to_string()));
        }

        let distance_meters = geometry::path_length_m(points) * self.road_factor;
        Ok(RoutedPath {
            polyline: points.to_vec(),
            distance_meters,
            duration_seconds: distance_meters / 1000.0 / mode.average_speed_kmh() * 3600.0,
        })
    }

    fn engine_name(&self) -> &'static str {
        "simulated"
    }
}

/// Every call fails at the transport level.
#[allow(dead_code)]
pub struct FailingRoutingEngine;

#[async_trait]
impl RoutingEngine for FailingRoutingEngine {
    async fn compute_route(
        &self,
        _points: &[Coordinates],
        _mode: &TransportMode,
    ) -> Result<RoutedPath> {
        Err(AppError::Routing("connection refused".to_string()))
    }

    fn engine_name(&self) -> &'static str {
        "failing"
    }
}

/// Always reports the same length, whatever the points.
#[allow(dead_code)]
pub struct FixedDistanceEngine {
    pub distance_km: f64,
}

#[async_trait]
impl RoutingEngine for FixedDistanceEngine {
    async fn compute_route(
        &self,
        points: &[Coordinates],
        _mode: &TransportMode,
    ) -> Result<RoutedPath> {
        Ok(RoutedPath {
            polyline: points.to_vec(),
            distance_meters: self.distance_km * 1000.0,
            duration_seconds: self.distance_km * 720.0,
        })
    }

    fn engine_name(&self) -> &'static str {
        "fixed"
    }
}

/// Canned place-search results keyed by query term. Unknown terms find nothing.
#[allow(dead_code)]
#[derive(Default)]
pub struct StaticPlaceSearch {
    results: HashMap<String, Vec<PlaceResult>>,
}

#[allow(dead_code)]
impl StaticPlaceSearch {
    pub fn with(mut self, term: &str, places: Vec<PlaceResult>) -> Self {
        self.results.insert(term.to_string(), places);
        self
    }
}

#[async_trait]
impl PlaceSearch for StaticPlaceSearch {
    async fn search(
        &self,
        query: &str,
        _center: &Coordinates,
        _radius_m: f64,
    ) -> Result<Vec<PlaceResult>> {
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

/// Resolves every address to one point and every point to one address.
#[allow(dead_code)]
pub struct StaticGeocoder {
    pub point: Coordinates,
    pub address: String,
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Coordinates> {
        Ok(self.point)
    }

    async fn reverse_geocode(&self, _point: &Coordinates) -> Result<String> {
        Ok(self.address.clone())
    }
}

#[allow(dead_code)]
pub fn place(name: &str, category: &str, lat: f64, lng: f64) -> PlaceResult {
    PlaceResult {
        location: Coordinates::new(lat, lng).unwrap(),
        display_name: name.to_string(),
        category: category.to_string(),
        importance: None,
    }
}

/// Default generator settings without the courtesy pause between attempts.
#[allow(dead_code)]
pub fn test_config() -> RouteGeneratorConfig {
    RouteGeneratorConfig {
        attempt_delay_ms: 0,
        ..RouteGeneratorConfig::default()
    }
}

#[allow(dead_code)]
pub fn generator(
    engine: Arc<dyn RoutingEngine>,
    search: StaticPlaceSearch,
) -> RouteGenerator {
    let config = test_config();
    let poi_service = PoiService::new(Arc::new(search), &config);
    RouteGenerator::new(engine, poi_service, config)
}

#[allow(dead_code)]
pub fn paris() -> Coordinates {
    Coordinates::new(48.8566, 2.3522).unwrap()
}

/// Check if we should skip real API tests
#[allow(dead_code)]
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("SKIP_REAL_API_TESTS").is_ok() || std::env::var("MAPBOX_API_KEY").is_err()
}
