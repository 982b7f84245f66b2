use crate::error::{AppError, Result};
use crate::models::route::LoopRouteRequest;
use crate::services::route_generator::context::RequestContext;
use crate::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// POST /routes/loop
/// Generate a loop route that starts and ends at the same point
pub async fn create_loop_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoopRouteRequest>,
) -> Result<Response> {
    request.validate()?;

    tracing::info!(
        lat = request.start_point.lat,
        lng = request.start_point.lng,
        distance_km = request.distance_km,
        mode = %request.mode,
        "Loop route request: ({:.4}, {:.4}), {:.1}km, mode={}",
        request.start_point.lat, request.start_point.lng,
        request.distance_km, request.mode
    );

    let ctx = RequestContext::for_request(
        &request.start_point,
        request.distance_km,
        request.preferences.seed,
    );
    // Client disconnects drop this future; stop the search with it.
    let _cancel_on_drop = ctx.cancel.clone().drop_guard();

    match state
        .route_generator
        .generate_loop_route(&request, &ctx)
        .await
    {
        Ok(response) => Ok(Json(response).into_response()),
        Err(e @ AppError::RoutingUnavailable { .. }) => {
            let fallback = state
                .route_generator
                .fallback_loop_route(&request, &ctx)
                .ok();
            Ok(super::routing_unavailable_response(e, fallback))
        }
        Err(e) => Err(e),
    }
}
