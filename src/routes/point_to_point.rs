use crate::error::{AppError, Result};
use crate::models::route::PointToPointRouteRequest;
use crate::services::route_generator::context::RequestContext;
use crate::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// POST /routes/point-to-point
/// Generate a route between two points, lengthened with detours when a
/// target distance is given
pub async fn create_point_to_point_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PointToPointRouteRequest>,
) -> Result<Response> {
    request.validate()?;

    tracing::info!(
        distance_km = ?request.distance_km,
        mode = %request.mode,
        "Point-to-point request: ({:.4}, {:.4}) -> ({:.4}, {:.4}), mode={}",
        request.start_point.lat, request.start_point.lng,
        request.end_point.lat, request.end_point.lng, request.mode
    );

    let seed_distance = request
        .distance_km
        .unwrap_or_else(|| request.start_point.distance_to(&request.end_point));
    let ctx = RequestContext::for_request(
        &request.start_point,
        seed_distance,
        request.preferences.seed,
    );
    let _cancel_on_drop = ctx.cancel.clone().drop_guard();

    match state
        .route_generator
        .generate_point_to_point_route(&request, &ctx)
        .await
    {
        Ok(response) => Ok(Json(response).into_response()),
        Err(e @ AppError::RoutingUnavailable { .. }) => {
            let fallback = state.route_generator.fallback_point_to_point_route(&request);
            Ok(super::routing_unavailable_response(e, Some(fallback)))
        }
        Err(e) => Err(e),
    }
}
