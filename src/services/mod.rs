pub mod geocoding;
pub mod mapbox;
pub mod nominatim;
pub mod place_search;
pub mod poi_service;
pub mod route_generator;
pub mod routing;
