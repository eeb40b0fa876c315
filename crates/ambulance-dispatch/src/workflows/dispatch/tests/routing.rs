use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::DispatchConfig;
use crate::http::{ApiJson, ApiQuery, HospitalContext, HOSPITAL_HEADER};
use crate::store::InMemoryStore;
use crate::workflows::dispatch::lifecycle::CallStatus;
use crate::workflows::dispatch::requests::DispatchRequest;
use crate::workflows::dispatch::router::{self, dispatch_router};
use crate::workflows::dispatch::DispatchService;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(HOSPITAL_HEADER, "hosp-1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(HOSPITAL_HEADER, "hosp-1")
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn create_call_route_returns_created_envelope() {
    let (service, _) = build_service();
    let app = dispatch_router(Arc::new(service));

    let response = app
        .oneshot(json_request("POST", "/api/v1/ambulance/calls", new_call_payload()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["message"], json!("Ambulance call created successfully"));
    assert_eq!(payload["data"]["status"], json!("pending"));
    assert_eq!(payload["data"]["emergency"]["type"], json!("cardiac"));
}

#[tokio::test]
async fn missing_hospital_header_is_unauthorized() {
    let (service, _) = build_service();
    let app = dispatch_router(Arc::new(service));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/ambulance/calls")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
}

#[tokio::test]
async fn dispatch_handler_returns_not_found_for_unknown_driver() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let call = service.create_call(&hospital(), new_call()).expect("created");

    let response = router::dispatch_handler::<InMemoryStore>(
        State(service.clone()),
        HospitalContext(hospital()),
        Path(call.id.0.clone()),
        ApiJson(DispatchRequest {
            driver_id: Some(crate::workflows::dispatch::domain::DriverId(
                "drv-missing".to_string(),
            )),
            ..DispatchRequest::default()
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], json!("Driver not found"));
    assert_eq!(payload["success"], json!(false));
}

#[tokio::test]
async fn malformed_dispatch_body_keeps_error_envelope() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let call = service.create_call(&hospital(), new_call()).expect("created");
    let app = dispatch_router(service.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/ambulance/calls/{}/dispatch", call.id.0),
            json!({ "estimatedArrival": "soon" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["message"], json!("Invalid request"));
    assert!(payload["error"].as_str().is_some_and(|error| !error.is_empty()));

    let untouched = service.get_call(&hospital(), &call.id).expect("call present");
    assert_eq!(untouched.status, CallStatus::Pending);
}

#[tokio::test]
async fn unparseable_json_keeps_error_envelope() {
    let (service, _) = build_service();
    let app = dispatch_router(Arc::new(service));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/ambulance/calls")
                .header(HOSPITAL_HEADER, "hosp-1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"caller\":"))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["message"], json!("Invalid request"));
}

#[tokio::test]
async fn malformed_query_keeps_error_envelope() {
    let (service, _) = build_service();
    let app = dispatch_router(Arc::new(service));

    for uri in [
        "/api/v1/ambulance/calls?page=abc",
        "/api/v1/dispatch/stats?startDate=yesterday",
    ] {
        let response = app
            .clone()
            .oneshot(get_request(uri))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let payload = read_json_body(response).await;
        assert_eq!(payload["success"], json!(false), "{uri}");
        assert_eq!(payload["message"], json!("Invalid request"), "{uri}");
    }
}

#[tokio::test]
async fn status_route_rejects_invalid_transition() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let call = service.create_call(&hospital(), new_call()).expect("created");
    let app = dispatch_router(service);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/ambulance/calls/{}/status", call.id.0),
            json!({ "status": "completed" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("cannot move call from pending to completed"));
}

#[tokio::test]
async fn cancel_route_accepts_missing_body() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let call = service.create_call(&hospital(), new_call()).expect("created");
    let app = dispatch_router(service);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/ambulance/calls/{}/cancel", call.id.0))
                .header(HOSPITAL_HEADER, "hosp-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["status"], json!("cancelled"));
}

#[tokio::test]
async fn list_route_reports_pagination() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    for _ in 0..3 {
        service.create_call(&hospital(), new_call()).expect("created");
    }
    let app = dispatch_router(service);

    let response = app
        .oneshot(get_request("/api/v1/ambulance/calls?status=all&page=2&limit=2"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["pagination"],
        json!({ "page": 2, "limit": 2, "total": 3, "pages": 2 })
    );
    assert_eq!(payload["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn board_route_uses_board_labels() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let call = service.create_call(&hospital(), new_call()).expect("created");
    service.dispatch(&hospital(), &call.id, crew()).expect("dispatched");
    service
        .update_status(
            &hospital(),
            &call.id,
            crate::workflows::dispatch::requests::StatusChange {
                status: Some("en_route".to_string()),
                notes: None,
            },
        )
        .expect("en route");
    let app = dispatch_router(service);

    let response = app
        .oneshot(get_request("/api/v1/dispatch/calls?status=en-route"))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    assert_eq!(payload["data"][0]["status"], json!("en-route"));
    assert_eq!(payload["data"][0]["assignedVehicle"], json!("AMB-12"));
}

#[tokio::test]
async fn operator_routes_create_then_update() {
    let (service, _) = build_service();
    let app = dispatch_router(Arc::new(service));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/dispatch/operators",
            json!({ "userId": DISPATCHER, "status": "available" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    let operator_id = payload["data"]["id"]
        .as_str()
        .expect("operator id")
        .to_string();

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/dispatch/operators/{operator_id}/status"),
            json!({ "status": "offline" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["status"], json!("offline"));
}

#[tokio::test]
async fn handler_maps_outage_to_internal_error() {
    let service = Arc::new(DispatchService::new(
        Arc::new(UnavailableStore),
        DispatchConfig::default(),
    ));

    let response = router::stats_handler::<UnavailableStore>(
        State(service),
        HospitalContext(hospital()),
        ApiQuery(Default::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], json!("Failed to fetch dispatch statistics"));
}
