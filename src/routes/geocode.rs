use crate::error::Result;
use crate::models::Coordinates;
use crate::services::geocoding::Geocoder;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    pub query: String,
    pub point: Coordinates,
}

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct ReverseGeocodeResponse {
    pub point: Coordinates,
    pub address: String,
}

/// GET /geocode?q=
pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>> {
    let point = state.geocoder.geocode(&query.q).await?;
    Ok(Json(GeocodeResponse {
        query: query.q,
        point,
    }))
}

/// GET /geocode/reverse?lat=&lng=
pub async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Result<Json<ReverseGeocodeResponse>> {
    let point = Coordinates::new(query.lat, query.lng)?;
    let address = state.geocoder.reverse_geocode(&point).await?;
    Ok(Json(ReverseGeocodeResponse { point, address }))
}
