use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, patch, post},
    Router,
};

use super::domain::{CallId, OperatorId};
use super::repository::DispatchStore;
use super::requests::{
    CallQuery, CallUpdate, CancelRequest, DispatchRequest, NewCall, OperatorQuery,
    OperatorStatusChange, OperatorUpsert, StatusChange,
};
use super::service::DispatchService;
use crate::http::{ApiJson, ApiQuery, ApiResponse, DateRange, HospitalContext};

/// Router builder exposing the call lifecycle, dispatch board and operator endpoints.
pub fn dispatch_router<S>(service: Arc<DispatchService<S>>) -> Router
where
    S: DispatchStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/ambulance/calls",
            get(list_calls_handler::<S>).post(create_call_handler::<S>),
        )
        .route(
            "/api/v1/ambulance/calls/:call_id",
            get(get_call_handler::<S>).patch(update_call_handler::<S>),
        )
        .route(
            "/api/v1/ambulance/calls/:call_id/dispatch",
            post(dispatch_handler::<S>),
        )
        .route(
            "/api/v1/ambulance/calls/:call_id/status",
            patch(status_handler::<S>),
        )
        .route(
            "/api/v1/ambulance/calls/:call_id/cancel",
            post(cancel_handler::<S>),
        )
        .route("/api/v1/dispatch/calls", get(board_handler::<S>))
        .route("/api/v1/dispatch/stats", get(stats_handler::<S>))
        .route(
            "/api/v1/dispatch/operators",
            get(operators_handler::<S>).post(upsert_operator_handler::<S>),
        )
        .route(
            "/api/v1/dispatch/operators/:operator_id/status",
            patch(operator_status_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn list_calls_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    ApiQuery(query): ApiQuery<CallQuery>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.list_calls(&hospital, &query) {
        Ok(page) => ApiResponse::paged(page).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch ambulance calls"),
    }
}

pub(crate) async fn get_call_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    Path(call_id): Path<String>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.get_call(&hospital, &CallId(call_id)) {
        Ok(call) => ApiResponse::data(call).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch ambulance call"),
    }
}

pub(crate) async fn create_call_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    ApiJson(request): ApiJson<NewCall>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.create_call(&hospital, request) {
        Ok(call) => ApiResponse::with_message("Ambulance call created successfully", call)
            .respond(StatusCode::CREATED),
        Err(error) => error.into_response_for("create ambulance call"),
    }
}

pub(crate) async fn update_call_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    Path(call_id): Path<String>,
    ApiJson(update): ApiJson<CallUpdate>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.update_call(&hospital, &CallId(call_id), update) {
        Ok(call) => ApiResponse::with_message("Ambulance call updated successfully", call)
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("update ambulance call"),
    }
}

pub(crate) async fn dispatch_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    Path(call_id): Path<String>,
    ApiJson(request): ApiJson<DispatchRequest>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.dispatch(&hospital, &CallId(call_id), request) {
        Ok(call) => ApiResponse::with_message("Ambulance dispatched successfully", call)
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("dispatch ambulance"),
    }
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    Path(call_id): Path<String>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.update_status(&hospital, &CallId(call_id), change) {
        Ok(call) => ApiResponse::with_message("Call status updated successfully", call)
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("update call status"),
    }
}

pub(crate) async fn cancel_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    Path(call_id): Path<String>,
    request: Option<ApiJson<CancelRequest>>,
) -> Response
where
    S: DispatchStore + 'static,
{
    let reason = request.and_then(|ApiJson(request)| request.reason);
    match service.cancel(&hospital, &CallId(call_id), reason) {
        Ok(call) => ApiResponse::with_message("Call cancelled successfully", call)
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("cancel call"),
    }
}

pub(crate) async fn board_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    ApiQuery(query): ApiQuery<CallQuery>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.board(&hospital, &query) {
        Ok(page) => ApiResponse::paged(page).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch dispatch calls"),
    }
}

pub(crate) async fn stats_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    ApiQuery(range): ApiQuery<DateRange>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.stats(&hospital, range) {
        Ok(stats) => ApiResponse::data(stats).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch dispatch statistics"),
    }
}

pub(crate) async fn operators_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    ApiQuery(query): ApiQuery<OperatorQuery>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.operators(&hospital, query.status.as_deref()) {
        Ok(operators) => ApiResponse::data(operators).respond(StatusCode::OK),
        Err(error) => error.into_response_for("fetch dispatch operators"),
    }
}

pub(crate) async fn upsert_operator_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    ApiJson(request): ApiJson<OperatorUpsert>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.upsert_operator(&hospital, request) {
        Ok((operator, true)) => {
            ApiResponse::with_message("Dispatch operator created successfully", operator)
                .respond(StatusCode::CREATED)
        }
        Ok((operator, false)) => {
            ApiResponse::with_message("Dispatch operator updated successfully", operator)
                .respond(StatusCode::CREATED)
        }
        Err(error) => error.into_response_for("save dispatch operator"),
    }
}

pub(crate) async fn operator_status_handler<S>(
    State(service): State<Arc<DispatchService<S>>>,
    HospitalContext(hospital): HospitalContext,
    Path(operator_id): Path<String>,
    ApiJson(change): ApiJson<OperatorStatusChange>,
) -> Response
where
    S: DispatchStore + 'static,
{
    match service.update_operator_status(&hospital, &OperatorId(operator_id), change) {
        Ok(operator) => ApiResponse::with_message("Operator status updated successfully", operator)
            .respond(StatusCode::OK),
        Err(error) => error.into_response_for("update operator status"),
    }
}
