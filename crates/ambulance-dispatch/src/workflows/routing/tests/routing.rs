use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::http::{HospitalContext, HOSPITAL_HEADER};
use crate::store::InMemoryStore;
use crate::workflows::dispatch::tests::common::read_json_body;
use crate::workflows::routing::router::{self, route_router};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(HOSPITAL_HEADER, "hosp-1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn create_then_fetch_route() {
    let (service, _) = build_service();
    let app = route_router(Arc::new(service));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/ambulance/routes",
            new_route_payload(),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["status"], json!("planned"));
    let id = payload["data"]["id"].as_str().expect("id").to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/ambulance/routes/{id}"))
                .header(HOSPITAL_HEADER, "hosp-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["data"]["endLocation"]["name"],
        json!("Harborview Medical Center")
    );
}

#[tokio::test]
async fn get_handler_returns_not_found() {
    let (service, _) = build_service();

    let response = router::get_handler::<InMemoryStore, FixedEstimator>(
        State(Arc::new(service)),
        HospitalContext(hospital()),
        Path("route-ghost".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], json!("Ambulance route not found"));
}

#[tokio::test]
async fn optimize_route_is_not_shadowed_by_id_route() {
    let (service, _) = build_service();
    let app = route_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/ambulance/routes/optimize",
            json!({ "criteria": ["traffic"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["totalRoutes"], json!(0));
    assert_eq!(payload["data"]["averageTimeSaved"], json!(0.0));
}

#[tokio::test]
async fn invalid_route_filter_is_bad_request() {
    let (service, _) = build_service();
    let app = route_router(Arc::new(service));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/ambulance/routes?trafficLevel=gridlock")
                .header(HOSPITAL_HEADER, "hosp-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_alert_body_keeps_error_envelope() {
    let (service, _) = build_service();
    let app = route_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/ambulance/traffic-alerts",
            json!({ "severity": "apocalyptic", "description": "Bridge closed" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["message"], json!("Invalid request"));
}

#[tokio::test]
async fn traffic_alert_routes_round_trip() {
    let (service, _) = build_service();
    let app = route_router(Arc::new(service));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/ambulance/traffic-alerts",
            json!({
                "location": { "address": "Aurora Bridge", "coordinates": { "lat": 47.646, "lng": -122.347 } },
                "type": "congestion",
                "severity": "medium",
                "description": "Stalled bus in the northbound lane"
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/ambulance/traffic-alerts?severity=medium")
                .header(HOSPITAL_HEADER, "hosp-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["data"][0]["status"], json!("active"));
}
