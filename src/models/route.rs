use crate::error::{AppError, Result};
use crate::models::{Coordinates, Marker, MarkerKind, PoiCandidate, PoiCategory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Shortest and longest target distances accepted from clients.
const MIN_TARGET_KM: f64 = 0.5;
const MAX_TARGET_KM: f64 = 200.0;
/// Start and end closer than this are treated as a loop request.
const MIN_POINT_TO_POINT_SEPARATION_KM: f64 = 0.05;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Walk,
    Run,
    Bike,
}

impl TransportMode {
    /// Returns the Mapbox profile name for this transport mode
    pub fn mapbox_profile(&self) -> &str {
        match self {
            TransportMode::Walk | TransportMode::Run => "walking",
            TransportMode::Bike => "cycling",
        }
    }

    pub fn is_cycling(&self) -> bool {
        matches!(self, TransportMode::Bike)
    }

    /// Average speed used when the router gives no duration (direct-line fallback).
    pub fn average_speed_kmh(&self) -> f64 {
        match self {
            TransportMode::Walk => 5.0,
            TransportMode::Run => 10.0,
            TransportMode::Bike => 16.0,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Walk => write!(f, "walk"),
            TransportMode::Run => write!(f, "run"),
            TransportMode::Bike => write!(f, "bike"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "walk" | "walking" => Ok(TransportMode::Walk),
            "run" | "running" | "jog" => Ok(TransportMode::Run),
            "bike" | "cycling" | "bicycle" => Ok(TransportMode::Bike),
            _ => Err(format!("Invalid transport mode: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteTopology {
    Loop,
    PointToPoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutePreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poi_categories: Option<Vec<PoiCategory>>,
    /// Fixes the jitter RNG so identical requests produce identical waypoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl RoutePreferences {
    pub fn categories(&self) -> &[PoiCategory] {
        self.poi_categories.as_deref().unwrap_or(&[])
    }
}

/// How a variant picks its POIs from the per-category pools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VariantStrategy {
    BestFromEachCategory,
    MaxTotalScore,
    MaxDiversity,
}

impl fmt::Display for VariantStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantStrategy::BestFromEachCategory => write!(f, "best-from-each-category"),
            VariantStrategy::MaxTotalScore => write!(f, "max-total-score"),
            VariantStrategy::MaxDiversity => write!(f, "max-diversity"),
        }
    }
}

/// One candidate POI plan competing for selection.
#[derive(Debug, Clone, Serialize)]
pub struct RouteVariant {
    pub waypoints: Vec<Coordinates>,
    pub selected_pois: Vec<PoiCandidate>,
    pub strategy: VariantStrategy,
    pub estimated_distance_km: f64,
    pub distance_fit_score: f64,
    pub importance_score: f64,
    pub total_score: f64,
}

/// Outcome of one routed attempt in the distance-matching loop.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SearchAttempt {
    pub attempt_index: usize,
    pub radius_factor: f64,
    pub resulting_distance_km: f64,
    pub deviation_km: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Best attempt is within tolerance.
    Accepted,
    /// Attempt budget ran out; best-seen attempt returned.
    Exhausted,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub status: SearchStatus,
    pub attempts: usize,
    pub tolerance_km: f64,
    pub best: SearchAttempt,
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub id: Uuid,
    pub topology: RouteTopology,
    pub distance_km: f64,
    pub estimated_duration_minutes: u32,
    /// Router polyline
    pub path: Vec<Coordinates>,
    /// Full ordered point list handed to the router, start and end included
    pub waypoints: Vec<Coordinates>,
    /// POIs incorporated as waypoints
    pub pois: Vec<PoiCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<VariantStrategy>,
    pub markers: Vec<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchSummary>,
    pub direct_line_fallback: bool,
}

impl Route {
    pub fn new(
        topology: RouteTopology,
        distance_km: f64,
        estimated_duration_minutes: u32,
        path: Vec<Coordinates>,
        waypoints: Vec<Coordinates>,
    ) -> Self {
        let mut route = Route {
            id: Uuid::new_v4(),
            topology,
            distance_km,
            estimated_duration_minutes,
            path,
            waypoints,
            pois: Vec::new(),
            strategy: None,
            markers: Vec::new(),
            search: None,
            direct_line_fallback: false,
        };
        route.markers = route.build_markers();
        route
    }

    pub fn with_pois(mut self, pois: Vec<PoiCandidate>, strategy: Option<VariantStrategy>) -> Self {
        self.pois = pois;
        self.strategy = strategy;
        self.markers = self.build_markers();
        self
    }

    pub fn with_search(mut self, summary: SearchSummary) -> Self {
        self.search = Some(summary);
        self
    }

    fn build_markers(&self) -> Vec<Marker> {
        let Some((first, rest)) = self.waypoints.split_first() else {
            return Vec::new();
        };

        let mut markers = vec![Marker::new(MarkerKind::Start, *first, None)];
        let (middle, last) = match self.topology {
            // Loops end where they start: no separate end marker.
            RouteTopology::Loop => match rest.split_last() {
                Some((_, middle)) => (middle, None),
                None => (rest, None),
            },
            RouteTopology::PointToPoint => match rest.split_last() {
                Some((last, middle)) => (middle, Some(*last)),
                None => (rest, None),
            },
        };

        for point in middle {
            let poi = self.pois.iter().find(|p| p.location == *point);
            markers.push(match poi {
                Some(poi) => Marker::new(MarkerKind::Poi, *point, Some(poi.name.clone())),
                None => Marker::new(MarkerKind::Waypoint, *point, None),
            });
        }

        if let Some(end) = last {
            markers.push(Marker::new(MarkerKind::End, end, None));
        }
        markers
    }
}

// Request/Response types for API endpoints

fn validate_target(distance_km: f64) -> Result<()> {
    if !(MIN_TARGET_KM..=MAX_TARGET_KM).contains(&distance_km) {
        return Err(AppError::InvalidRequest(format!(
            "distance_km must be between {} and {}",
            MIN_TARGET_KM, MAX_TARGET_KM
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoopRouteRequest {
    pub start_point: Coordinates,
    pub distance_km: f64,
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default)]
    pub preferences: RoutePreferences,
}

impl LoopRouteRequest {
    pub fn validate(&self) -> Result<()> {
        self.start_point.validate()?;
        validate_target(self.distance_km)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointToPointRouteRequest {
    pub start_point: Coordinates,
    pub end_point: Coordinates,
    /// Desired total length. Without one the direct route is returned.
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default)]
    pub preferences: RoutePreferences,
}

impl PointToPointRouteRequest {
    pub fn validate(&self) -> Result<()> {
        self.start_point.validate()?;
        self.end_point.validate()?;
        if self.start_point.distance_to(&self.end_point) < MIN_POINT_TO_POINT_SEPARATION_KM {
            return Err(AppError::InvalidRequest(
                "start_point and end_point are the same place; request a loop route instead"
                    .to_string(),
            ));
        }
        if let Some(distance_km) = self.distance_km {
            validate_target(distance_km)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: Route,
    /// Ranked POI variants considered for this route, best first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<RouteVariant>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
