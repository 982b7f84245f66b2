use crate::constants::MAPBOX_MAX_WAYPOINTS;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, TransportMode};
use crate::services::routing::{RoutedPath, RoutingEngine};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const MAPBOX_DIRECTIONS_BASE_URL: &str = "https://api.mapbox.com/directions/v5/mapbox";

/// How the client authenticates with the directions API.
#[derive(Clone, Debug)]
pub enum AuthMode {
    /// Send `access_token` query param (direct Mapbox).
    DirectToken,
    /// Proxy mode: send `Authorization: Bearer` header.
    BearerHeader,
}

#[derive(Clone)]
pub struct MapboxClient {
    client: Client,
    api_key: String,
    base_url: String,
    auth_mode: AuthMode,
}

impl MapboxClient {
    pub fn new(api_key: String) -> Self {
        MapboxClient {
            client: Client::new(),
            api_key,
            base_url: MAPBOX_DIRECTIONS_BASE_URL.to_string(),
            auth_mode: AuthMode::DirectToken,
        }
    }

    pub fn with_config(api_key: String, base_url: String, auth_mode: AuthMode) -> Self {
        MapboxClient {
            client: Client::new(),
            api_key,
            base_url,
            auth_mode,
        }
    }

    /// Get directions through the waypoints, in order.
    pub async fn get_directions(
        &self,
        waypoints: &[Coordinates],
        mode: &TransportMode,
    ) -> Result<RoutedPath> {
        if waypoints.len() < 2 {
            return Err(AppError::InvalidRequest(
                "At least 2 waypoints required".to_string(),
            ));
        }

        if waypoints.len() > MAPBOX_MAX_WAYPOINTS {
            return Err(AppError::InvalidRequest(format!(
                "Maximum {} waypoints allowed, got {}",
                MAPBOX_MAX_WAYPOINTS,
                waypoints.len()
            )));
        }

        // Mapbox wants "lng,lat;lng,lat;..."
        let coordinates_str = waypoints
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/{}/{}",
            self.base_url,
            mode.mapbox_profile(),
            coordinates_str
        );

        tracing::debug!(
            waypoints = waypoints.len(),
            mode = %mode.mapbox_profile(),
            "Mapbox API request: {} waypoints, profile {}",
            waypoints.len(), mode.mapbox_profile()
        );

        let mut request = self.client.get(&url).query(&[
            ("geometries", "geojson"),
            ("overview", "full"),
            ("steps", "false"),
        ]);

        match self.auth_mode {
            AuthMode::DirectToken => {
                request = request.query(&[("access_token", &self.api_key)]);
            }
            AuthMode::BearerHeader => {
                request = request.bearer_auth(&self.api_key);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Routing(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                waypoints = waypoints.len(),
                "Mapbox API HTTP error {}: {}",
                status, error_text
            );
            return Err(AppError::Routing(format!("HTTP {}: {}", status, error_text)));
        }

        let directions: MapboxDirectionsApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Routing(format!("Failed to parse response: {}", e)))?;

        let Some(route) = directions.routes.into_iter().next() else {
            tracing::warn!(
                waypoints = waypoints.len(),
                mode = %mode.mapbox_profile(),
                code = %directions.code,
                "Mapbox returned 0 routes for {} waypoints ({})",
                waypoints.len(), mode.mapbox_profile()
            );
            return Err(AppError::Routing("No routes found".to_string()));
        };

        tracing::debug!(
            distance_km = %format!("{:.2}", route.distance / 1000.0),
            duration_min = %format!("{:.0}", route.duration / 60.0),
            path_points = route.geometry.coordinates.len(),
            "Mapbox response: {:.2}km, {:.0}min, {} path points",
            route.distance / 1000.0, route.duration / 60.0, route.geometry.coordinates.len()
        );

        Ok(RoutedPath {
            polyline: geojson_to_coordinates(&route.geometry.coordinates),
            distance_meters: route.distance,
            duration_seconds: route.duration,
        })
    }
}

#[async_trait]
impl RoutingEngine for MapboxClient {
    async fn compute_route(
        &self,
        points: &[Coordinates],
        mode: &TransportMode,
    ) -> Result<RoutedPath> {
        self.get_directions(points, mode).await
    }

    fn engine_name(&self) -> &'static str {
        "mapbox"
    }
}

/// GeoJSON `[lng, lat]` pairs to coordinates, dropping anything out of range.
fn geojson_to_coordinates(geometry: &[[f64; 2]]) -> Vec<Coordinates> {
    geometry
        .iter()
        .filter_map(|coord| Coordinates::new(coord[1], coord[0]).ok())
        .collect()
}

// Mapbox API response types

#[derive(Debug, Deserialize)]
struct MapboxDirectionsApiResponse {
    routes: Vec<MapboxRoute>,
    code: String,
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    distance: f64, // meters
    duration: f64, // seconds
    geometry: MapboxGeometry,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat] pairs
}
