//! Stable application-wide constants.
//!
//! Values here are structural invariants, algorithm coefficients, and default
//! fallbacks for env-var-based configuration. They should rarely change.
//! For tuning knobs that benefit from runtime experimentation, see
//! [`RouteGeneratorConfig`](crate::config::RouteGeneratorConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- External services ---

/// Public Nominatim instance used for place search and geocoding.
pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
/// Mapbox rejects requests with more coordinates than this.
pub const MAPBOX_MAX_WAYPOINTS: usize = 25;
/// Results requested per place-search query.
pub const PLACE_SEARCH_RESULT_LIMIT: usize = 15;
/// Retries (after the first try) for a rate-limited or failing place search.
pub const PLACE_SEARCH_MAX_RETRIES: usize = 2;
/// Base of the exponential place-search backoff.
pub const PLACE_SEARCH_BACKOFF_BASE_MS: u64 = 500;
/// Per-request timeout for Nominatim calls.
pub const NOMINATIM_REQUEST_TIMEOUT_SECONDS: u64 = 10;

// --- Geocode cache ---

/// Default geocode cache TTL: 7 days. Overridden by `GEOCODE_CACHE_TTL`.
pub const DEFAULT_GEOCODE_CACHE_TTL_SECONDS: u64 = 604_800;
/// Maximum entries for the in-memory geocode cache.
pub const DEFAULT_MEMORY_CACHE_MAX_ENTRIES: u64 = 10_000;
/// Reverse-geocode keys round to 5 decimals (~1 m).
pub const REVERSE_GEOCODE_KEY_PRECISION: u32 = 5;

// --- Waypoint candidate generation ---
// Candidate count grows with target distance; cycling gets one extra
// candidate and a higher cap because cycling loops cover more ground.

/// Candidate count per distance bracket: (max target km, count).
pub const CANDIDATE_COUNT_BRACKETS: [(f64, usize); 3] = [(5.0, 3), (10.0, 4), (20.0, 5)];
/// Candidate count above the last bracket.
pub const CANDIDATE_COUNT_LONG: usize = 6;
/// Candidate cap for walking-like modes.
pub const CANDIDATE_CAP_WALKING: usize = 6;
/// Candidate cap for cycling.
pub const CANDIDATE_CAP_CYCLING: usize = 8;
/// Above this target, angular jitter shrinks and radius variation tightens.
pub const VERY_LONG_ROUTE_KM: f64 = 50.0;
/// Candidates closer than this to the center or to each other are dropped
/// (they collapse together near the poles).
pub const MIN_CANDIDATE_SEPARATION_M: f64 = 10.0;

// --- Adaptive radius factor bounds ---
// Attempt 2 clamps the correction ratio to [0.5, 2.0]; each later attempt
// loosens the lower bound by 0.1 and the upper by 0.5, within hard limits.

pub const RADIUS_RATIO_INITIAL_MIN: f64 = 0.5;
pub const RADIUS_RATIO_INITIAL_MAX: f64 = 2.0;
pub const RADIUS_RATIO_MIN_STEP: f64 = 0.1;
pub const RADIUS_RATIO_MAX_STEP: f64 = 0.5;
pub const RADIUS_RATIO_FLOOR: f64 = 0.2;
pub const RADIUS_RATIO_CEILING: f64 = 4.0;
/// Factor change applied after an attempt produced too few candidates.
pub const INSUFFICIENT_CANDIDATES_RADIUS_NUDGE: f64 = 0.8;

// --- POI scoring weights (points out of 100) ---

pub const POI_PROXIMITY_WEIGHT: f64 = 50.0;
pub const POI_IMPORTANCE_CAP: f64 = 30.0;
pub const POI_DIVERSITY_CAP: f64 = 15.0;
pub const POI_TYPE_BONUS_CAP: f64 = 5.0;
/// Diversity earns one point per this many meters from the nearest chosen waypoint.
pub const POI_DIVERSITY_METERS_PER_POINT: f64 = 500.0;
/// Provider importance above this earns a bonus.
pub const POI_IMPORTANCE_THRESHOLD: f64 = 0.4;
/// POIs farther than target / this divisor are excluded.
pub const POI_MAX_DISTANCE_DIVISOR: f64 = 3.0;

// --- Variant ranking weights ---

pub const VARIANT_DISTANCE_FIT_WEIGHT: f64 = 40.0;
pub const VARIANT_IMPORTANCE_CAP: f64 = 35.0;
pub const VARIANT_IMPORTANCE_DIVISOR: f64 = 2.0;
