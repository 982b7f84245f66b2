use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Check if services are working
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut status = json!({
        "status": "ok",
        "checks": {
            "routing_engine": state.route_generator.engine_name(),
        }
    });

    // A cache outage only degrades geocoding.
    let backend = state.cache.backend_name();
    if state.cache.health_check().await {
        status["checks"]["cache"] = json!({
            "backend": backend,
            "stats": state.cache.get_stats().await,
        });
    } else {
        status["checks"]["cache"] = json!({
            "backend": backend,
            "error": "unreachable",
        });
        status["status"] = json!("degraded");
    }

    Json(status)
}
