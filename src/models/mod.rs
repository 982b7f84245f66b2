pub mod coordinates;
pub mod geo;
pub mod marker;
pub mod poi;
pub mod route;

pub use coordinates::Coordinates;
pub use geo::BoundingBox;
pub use marker::{Marker, MarkerKind, MarkerStyle};
pub use poi::{PlaceResult, PoiCandidate, PoiCategory};
pub use route::{
    Route, RoutePreferences, RouteTopology, RouteVariant, SearchAttempt, SearchStatus,
    SearchSummary, TransportMode, VariantStrategy,
};
