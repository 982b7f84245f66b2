pub mod debug;
pub mod geocode;
pub mod loop_route;
pub mod point_to_point;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::Route;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/routes/loop", post(loop_route::create_loop_route))
        .route(
            "/routes/point-to-point",
            post(point_to_point::create_point_to_point_route),
        )
        .route("/geocode", get(geocode::geocode))
        .route("/geocode/reverse", get(geocode::reverse_geocode))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}

/// 503 body for an unreachable routing engine, carrying a straight-segment
/// route when one could be built.
fn routing_unavailable_response(error: AppError, fallback: Option<Route>) -> Response {
    let status = error.status_code();
    tracing::error!(
        error = %error,
        has_fallback = fallback.is_some(),
        "{}, returning direct-line fallback",
        error
    );

    let body = Json(json!({
        "error": status.canonical_reason().unwrap_or("Unknown error"),
        "message": "Routing service unavailable",
        "fallback": fallback,
    }));
    (status, body).into_response()
}
