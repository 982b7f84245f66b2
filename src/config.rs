use crate::constants::*;
use crate::models::PoiCategory;
use crate::services::route_generator::tolerance::{SearchRadiusTable, ToleranceTable};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mapbox_api_key: String,
    /// When set, directions go through this proxy with bearer auth.
    pub mapbox_base_url: Option<String>,
    pub nominatim_base_url: String,
    pub nominatim_user_agent: String,
    pub redis_url: Option<String>,
    pub geocode_cache_ttl: u64,
    pub route_generator: RouteGeneratorConfig,
}

/// Inclusive-exclusive range of multipliers, written `0.6..1.4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariationRange {
    pub min: f64,
    pub max: f64,
}

impl FromStr for VariationRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once("..")
            .ok_or_else(|| format!("Invalid range '{}', expected 'min..max'", s))?;
        let min: f64 = min.trim().parse().map_err(|_| format!("Invalid range min '{}'", min))?;
        let max: f64 = max.trim().parse().map_err(|_| format!("Invalid range max '{}'", max))?;
        if !(min > 0.0 && max >= min) {
            return Err(format!("Range must satisfy 0 < min <= max, got {}..{}", min, max));
        }
        Ok(VariationRange { min, max })
    }
}

impl fmt::Display for VariationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// Category → place-search query terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryQueryTerms(BTreeMap<PoiCategory, Vec<String>>);

impl CategoryQueryTerms {
    pub fn terms(&self, category: &PoiCategory) -> Vec<String> {
        self.0.get(category).cloned().unwrap_or_else(|| {
            category
                .default_query_terms()
                .iter()
                .map(|t| t.to_string())
                .collect()
        })
    }
}

/// Format: `park=park|garden;museum=museum|gallery`. Unlisted categories use
/// their built-in terms.
impl FromStr for CategoryQueryTerms {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut map = BTreeMap::new();
        for entry in s.split(';').filter(|e| !e.trim().is_empty()) {
            let (category, terms) = entry
                .split_once('=')
                .ok_or_else(|| format!("Invalid query-term entry '{}'", entry))?;
            let category: PoiCategory = category.parse()?;
            let terms: Vec<String> = terms
                .split('|')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if terms.is_empty() {
                return Err(format!("No query terms given for category '{}'", category));
            }
            map.insert(category, terms);
        }
        Ok(CategoryQueryTerms(map))
    }
}

#[derive(Debug, Clone)]
pub struct RouteGeneratorConfig {
    /// Allowed relative deviation per distance bracket for loop routes
    pub loop_tolerance: ToleranceTable,

    /// Allowed relative deviation per distance bracket for point-to-point detours
    pub point_to_point_tolerance: ToleranceTable,

    /// Base/max candidate radius per transport mode, as fractions of target
    pub search_radius: SearchRadiusTable,

    /// Attempt budget of the distance-matching loop
    pub max_attempts: usize,

    /// Extra attempts granted to targets above `long_route_threshold_km`
    pub long_route_extra_attempts: usize,

    pub long_route_threshold_km: f64,

    /// Pause between routing attempts (courtesy towards the routing service)
    pub attempt_delay_ms: u64,

    /// Fewer candidate waypoints than this is an error, not a degenerate loop
    pub min_candidate_waypoints: usize,

    /// Max angular jitter as a fraction of the angular step between candidates
    pub angle_jitter_fraction: f64,

    /// Per-candidate radius multiplier range
    pub radius_variation: VariationRange,

    /// Radius multiplier range above 50 km (asymmetric, biased inward)
    pub long_radius_variation: VariationRange,

    /// Direct point-to-point routes within this fraction of target are accepted
    pub direct_acceptance_pct: f64,

    pub poi_search_timeout_ms: u64,

    /// POIs kept per category after scoring and deduplication
    pub pois_per_category: usize,

    /// POIs closer than this are treated as duplicates
    pub poi_dedup_threshold_m: f64,

    /// Acceptance floor on POI total score (0-100)
    pub poi_min_score: f64,

    /// Haversine-to-road distance multiplier used for variant estimates
    pub road_factor: f64,

    /// Max sweeps of the swap refinement in the loop optimizer
    pub optimizer_max_iterations: usize,

    pub category_query_terms: CategoryQueryTerms,
}

impl Default for RouteGeneratorConfig {
    fn default() -> Self {
        Self {
            loop_tolerance: ToleranceTable::loop_default(),
            point_to_point_tolerance: ToleranceTable::point_to_point_default(),
            search_radius: SearchRadiusTable::default(),
            max_attempts: 8,
            long_route_extra_attempts: 2,
            long_route_threshold_km: 20.0,
            attempt_delay_ms: 300,
            min_candidate_waypoints: 2,
            angle_jitter_fraction: 0.3,
            radius_variation: VariationRange { min: 0.6, max: 1.4 },
            long_radius_variation: VariationRange {
                min: 0.75,
                max: 1.15,
            },
            direct_acceptance_pct: 0.2,
            poi_search_timeout_ms: 8_000,
            pois_per_category: 3,
            poi_dedup_threshold_m: 100.0,
            poi_min_score: 10.0,
            road_factor: 1.25,
            optimizer_max_iterations: 10,
            category_query_terms: CategoryQueryTerms::default(),
        }
    }
}

impl RouteGeneratorConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            loop_tolerance: env::var("ROUTE_LOOP_TOLERANCE")
                .unwrap_or_else(|_| defaults.loop_tolerance.to_string())
                .parse()
                .map_err(|e| format!("Invalid ROUTE_LOOP_TOLERANCE: {}", e))?,

            point_to_point_tolerance: env::var("ROUTE_P2P_TOLERANCE")
                .unwrap_or_else(|_| defaults.point_to_point_tolerance.to_string())
                .parse()
                .map_err(|e| format!("Invalid ROUTE_P2P_TOLERANCE: {}", e))?,

            search_radius: env::var("ROUTE_SEARCH_RADIUS")
                .unwrap_or_else(|_| defaults.search_radius.to_string())
                .parse()
                .map_err(|e| format!("Invalid ROUTE_SEARCH_RADIUS: {}", e))?,

            max_attempts: env::var("ROUTE_MAX_ATTEMPTS")
                .unwrap_or_else(|_| defaults.max_attempts.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_MAX_ATTEMPTS")?,

            long_route_extra_attempts: env::var("ROUTE_LONG_ROUTE_EXTRA_ATTEMPTS")
                .unwrap_or_else(|_| defaults.long_route_extra_attempts.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_LONG_ROUTE_EXTRA_ATTEMPTS")?,

            long_route_threshold_km: env::var("ROUTE_LONG_ROUTE_THRESHOLD_KM")
                .unwrap_or_else(|_| defaults.long_route_threshold_km.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_LONG_ROUTE_THRESHOLD_KM")?,

            attempt_delay_ms: env::var("ROUTE_ATTEMPT_DELAY_MS")
                .unwrap_or_else(|_| defaults.attempt_delay_ms.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_ATTEMPT_DELAY_MS")?,

            min_candidate_waypoints: env::var("ROUTE_MIN_CANDIDATE_WAYPOINTS")
                .unwrap_or_else(|_| defaults.min_candidate_waypoints.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_MIN_CANDIDATE_WAYPOINTS")?,

            angle_jitter_fraction: env::var("ROUTE_ANGLE_JITTER_FRACTION")
                .unwrap_or_else(|_| defaults.angle_jitter_fraction.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_ANGLE_JITTER_FRACTION")?,

            radius_variation: env::var("ROUTE_RADIUS_VARIATION")
                .unwrap_or_else(|_| defaults.radius_variation.to_string())
                .parse()
                .map_err(|e| format!("Invalid ROUTE_RADIUS_VARIATION: {}", e))?,

            long_radius_variation: env::var("ROUTE_LONG_RADIUS_VARIATION")
                .unwrap_or_else(|_| defaults.long_radius_variation.to_string())
                .parse()
                .map_err(|e| format!("Invalid ROUTE_LONG_RADIUS_VARIATION: {}", e))?,

            direct_acceptance_pct: env::var("ROUTE_DIRECT_ACCEPTANCE_PCT")
                .unwrap_or_else(|_| defaults.direct_acceptance_pct.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DIRECT_ACCEPTANCE_PCT")?,

            poi_search_timeout_ms: env::var("ROUTE_POI_SEARCH_TIMEOUT_MS")
                .unwrap_or_else(|_| defaults.poi_search_timeout_ms.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_POI_SEARCH_TIMEOUT_MS")?,

            pois_per_category: env::var("ROUTE_POIS_PER_CATEGORY")
                .unwrap_or_else(|_| defaults.pois_per_category.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_POIS_PER_CATEGORY")?,

            poi_dedup_threshold_m: env::var("ROUTE_POI_DEDUP_THRESHOLD_M")
                .unwrap_or_else(|_| defaults.poi_dedup_threshold_m.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_POI_DEDUP_THRESHOLD_M")?,

            poi_min_score: env::var("ROUTE_POI_MIN_SCORE")
                .unwrap_or_else(|_| defaults.poi_min_score.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_POI_MIN_SCORE")?,

            road_factor: env::var("ROUTE_ROAD_FACTOR")
                .unwrap_or_else(|_| defaults.road_factor.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_ROAD_FACTOR")?,

            optimizer_max_iterations: env::var("ROUTE_OPTIMIZER_MAX_ITERATIONS")
                .unwrap_or_else(|_| defaults.optimizer_max_iterations.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_OPTIMIZER_MAX_ITERATIONS")?,

            category_query_terms: match env::var("ROUTE_CATEGORY_QUERY_TERMS") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|e| format!("Invalid ROUTE_CATEGORY_QUERY_TERMS: {}", e))?,
                Err(_) => defaults.category_query_terms,
            },
        };

        if config.max_attempts == 0 {
            return Err("ROUTE_MAX_ATTEMPTS must be at least 1".to_string());
        }
        if config.min_candidate_waypoints < 1 {
            return Err("ROUTE_MIN_CANDIDATE_WAYPOINTS must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&config.angle_jitter_fraction) {
            return Err("ROUTE_ANGLE_JITTER_FRACTION must be in [0, 1)".to_string());
        }
        if config.road_factor < 1.0 {
            return Err("ROUTE_ROAD_FACTOR must be >= 1.0".to_string());
        }
        if !(0.0..1.0).contains(&config.direct_acceptance_pct) {
            return Err("ROUTE_DIRECT_ACCEPTANCE_PCT must be in [0, 1)".to_string());
        }
        if config.pois_per_category == 0 {
            return Err("ROUTE_POIS_PER_CATEGORY must be at least 1".to_string());
        }
        if config.poi_dedup_threshold_m < 0.0 {
            return Err("ROUTE_POI_DEDUP_THRESHOLD_M must be >= 0".to_string());
        }

        Ok(config)
    }

    /// Attempt budget for a target: base budget, plus extra for long routes.
    pub fn attempt_budget(&self, target_km: f64) -> usize {
        if target_km > self.long_route_threshold_km {
            self.max_attempts + self.long_route_extra_attempts
        } else {
            self.max_attempts
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            mapbox_api_key: env::var("MAPBOX_API_KEY").map_err(|_| "MAPBOX_API_KEY must be set")?,
            mapbox_base_url: env::var("MAPBOX_BASE_URL").ok(),
            nominatim_base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_BASE_URL.to_string()),
            nominatim_user_agent: env::var("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|_| format!("routeplanner/{}", env!("CARGO_PKG_VERSION"))),
            redis_url: env::var("REDIS_URL").ok(),
            geocode_cache_ttl: env::var("GEOCODE_CACHE_TTL")
                .unwrap_or_else(|_| DEFAULT_GEOCODE_CACHE_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid GEOCODE_CACHE_TTL")?,
            route_generator: RouteGeneratorConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
