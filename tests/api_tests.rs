use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use routeplanner::cache::{GeocodeCache, MemoryCacheService};
use routeplanner::models::Coordinates;
use routeplanner::services::geocoding::CachedGeocoder;
use routeplanner::services::routing::RoutingEngine;
use routeplanner::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::{FailingRoutingEngine, SimulatedRoutingEngine, StaticGeocoder, StaticPlaceSearch};

fn setup_test_app(engine: Arc<dyn RoutingEngine>) -> axum::Router {
    let cache: Arc<dyn GeocodeCache> = Arc::new(MemoryCacheService::new(3600, 100));
    let geocoder = CachedGeocoder::new(
        Arc::new(StaticGeocoder {
            point: Coordinates::new(48.8584, 2.2945).unwrap(),
            address: "Champ de Mars, Paris".to_string(),
        }),
        cache.clone(),
    );

    let state = Arc::new(AppState {
        route_generator: common::generator(engine, StaticPlaceSearch::default()),
        geocoder,
        cache,
    });

    routeplanner::routes::create_router(state)
}

fn simulated_app() -> axum::Router {
    setup_test_app(Arc::new(SimulatedRoutingEngine::new(1.2)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let request = Request::builder()
        .uri("/debug/health")
        .body(Body::empty())
        .unwrap();

    let response = simulated_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["routing_engine"], "simulated");
    assert_eq!(json["checks"]["cache"]["backend"], "memory");
}

#[tokio::test]
async fn test_loop_route_endpoint() {
    let payload = json!({
        "start_point": {"lat": 48.8566, "lng": 2.3522},
        "distance_km": 5.0,
        "mode": "walk",
        "preferences": {"seed": 42}
    });

    let response = simulated_app()
        .oneshot(post_json("/routes/loop", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let distance = json["route"]["distance_km"].as_f64().unwrap();
    assert!((distance - 5.0).abs() <= 0.25);
    assert_eq!(json["route"]["topology"], "loop");
    assert_eq!(json["route"]["search"]["status"], "accepted");
    assert_eq!(json["route"]["markers"][0]["kind"], "start");
    assert_eq!(json["route"]["direct_line_fallback"], false);
}

#[tokio::test]
async fn test_loop_route_endpoint_validation() {
    let invalid_request = json!({
        "start_point": {"lat": 48.8566, "lng": 2.3522},
        "distance_km": 0.1,  // Too small
        "mode": "walk",
        "preferences": {}
    });

    let response = simulated_app()
        .oneshot(post_json("/routes/loop", invalid_request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let out_of_range = json!({
        "start_point": {"lat": 123.0, "lng": 2.3522},
        "distance_km": 5.0
    });
    let response = simulated_app()
        .oneshot(post_json("/routes/loop", out_of_range))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("latitude"));
}

#[tokio::test]
async fn test_point_to_point_endpoint() {
    let payload = json!({
        "start_point": {"lat": 48.85, "lng": 2.35},
        "end_point": {"lat": 48.87, "lng": 2.37},
        "mode": "bike"
    });

    let response = simulated_app()
        .oneshot(post_json("/routes/point-to-point", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["route"]["topology"], "point_to_point");
    assert_eq!(json["route"]["waypoints"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unreachable_engine_returns_fallback() {
    let app = setup_test_app(Arc::new(FailingRoutingEngine));
    let payload = json!({
        "start_point": {"lat": 48.85, "lng": 2.35},
        "end_point": {"lat": 48.87, "lng": 2.37},
        "distance_km": 6.0,
        "mode": "walk"
    });

    let response = app
        .oneshot(post_json("/routes/point-to-point", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["fallback"]["direct_line_fallback"], true);
    assert_eq!(json["fallback"]["waypoints"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unreachable_engine_loop_fallback() {
    let app = setup_test_app(Arc::new(FailingRoutingEngine));
    let payload = json!({
        "start_point": {"lat": 48.8566, "lng": 2.3522},
        "distance_km": 5.0
    });

    let response = app.oneshot(post_json("/routes/loop", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Routing service unavailable");
    assert_eq!(json["fallback"]["topology"], "loop");
    assert_eq!(json["fallback"]["direct_line_fallback"], true);
}

#[tokio::test]
async fn test_geocode_endpoints() {
    let request = Request::builder()
        .uri("/geocode?q=Tour%20Eiffel")
        .body(Body::empty())
        .unwrap();
    let response = simulated_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["query"], "Tour Eiffel");
    assert_eq!(json["point"]["lat"], 48.8584);

    let request = Request::builder()
        .uri("/geocode/reverse?lat=48.8584&lng=2.2945")
        .body(Body::empty())
        .unwrap();
    let response = simulated_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["address"], "Champ de Mars, Paris");

    let request = Request::builder()
        .uri("/geocode/reverse?lat=95.0&lng=2.2945")
        .body(Body::empty())
        .unwrap();
    let response = simulated_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
