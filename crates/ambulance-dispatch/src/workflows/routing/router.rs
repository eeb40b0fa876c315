use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};

use super::domain::RouteId;
use super::optimizer::SavingsEstimator;
use super::repository::RoutingStore;
use super::requests::{
    AlertQuery, NewRoute, NewTrafficAlert, OptimizeRequest, RouteQuery, RouteUpdate,
};
use super::service::RouteService;
use crate::http::{ApiJson, ApiQuery, ApiResponse, DateRange, HospitalContext};

type SharedService<S, E> = State<Arc<RouteService<S, E>>>;

/// Router exposing route planning, optimization and traffic alert endpoints.
pub fn route_router<S, E>(service: Arc<RouteService<S, E>>) -> Router
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    Router::new()
        .route(
            "/api/v1/ambulance/routes",
            get(list_handler::<S, E>).post(create_handler::<S, E>),
        )
        .route(
            "/api/v1/ambulance/routes/optimize",
            post(optimize_handler::<S, E>),
        )
        .route("/api/v1/ambulance/routes/stats", get(stats_handler::<S, E>))
        .route(
            "/api/v1/ambulance/routes/:route_id",
            get(get_handler::<S, E>)
                .patch(update_handler::<S, E>)
                .delete(delete_handler::<S, E>),
        )
        .route(
            "/api/v1/ambulance/traffic-alerts",
            get(alerts_handler::<S, E>).post(create_alert_handler::<S, E>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    ApiQuery(query): ApiQuery<RouteQuery>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.list_routes(&hospital, &query) {
        Ok(page) => ApiResponse::paged(page).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch ambulance routes"),
    }
}

pub(crate) async fn get_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    Path(route_id): Path<String>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.get_route(&hospital, &RouteId(route_id)) {
        Ok(route) => ApiResponse::data(route).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch ambulance route"),
    }
}

pub(crate) async fn create_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    ApiJson(request): ApiJson<NewRoute>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.create_route(&hospital, request) {
        Ok(route) => ApiResponse::with_message("Ambulance route created successfully", route)
            .respond(StatusCode::CREATED),
        Err(error) => error.into_response_for("create ambulance route"),
    }
}

pub(crate) async fn update_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    Path(route_id): Path<String>,
    ApiJson(update): ApiJson<RouteUpdate>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.update_route(&hospital, &RouteId(route_id), update) {
        Ok(route) => ApiResponse::with_message("Ambulance route updated successfully", route)
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("update ambulance route"),
    }
}

pub(crate) async fn delete_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    Path(route_id): Path<String>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.delete_route(&hospital, &RouteId(route_id)) {
        Ok(()) => ApiResponse::message("Ambulance route deleted successfully")
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("delete ambulance route"),
    }
}

pub(crate) async fn optimize_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    ApiJson(request): ApiJson<OptimizeRequest>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.optimize(&hospital, request) {
        Ok(summary) => ApiResponse::with_message("Routes optimized successfully", summary)
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("optimize routes"),
    }
}

pub(crate) async fn stats_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    ApiQuery(range): ApiQuery<DateRange>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.stats(&hospital, range) {
        Ok(stats) => ApiResponse::data(stats).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch route statistics"),
    }
}

pub(crate) async fn alerts_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    ApiQuery(query): ApiQuery<AlertQuery>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.traffic_alerts(&hospital, &query) {
        Ok(alerts) => ApiResponse::data(alerts).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch traffic alerts"),
    }
}

pub(crate) async fn create_alert_handler<S, E>(
    State(service): SharedService<S, E>,
    HospitalContext(hospital): HospitalContext,
    ApiJson(request): ApiJson<NewTrafficAlert>,
) -> Response
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    match service.create_traffic_alert(&hospital, request) {
        Ok(alert) => ApiResponse::with_message("Traffic alert created successfully", alert)
            .respond(StatusCode::CREATED),
        Err(error) => error.into_response_for("create traffic alert"),
    }
}
