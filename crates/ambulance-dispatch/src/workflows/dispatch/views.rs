use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Call, CallId, Coordinates, Driver, Operator, OperatorStatus, Vehicle};
use super::lifecycle::CallStatus;

/// Status vocabulary of the dispatch board.
///
/// A pending call is `incoming` until an operator picks it up, then `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardStatus {
    Incoming,
    Processing,
    Dispatched,
    EnRoute,
    Arrived,
    InTransit,
    Completed,
    Cancelled,
}

impl BoardStatus {
    pub fn of(status: CallStatus, held_by_operator: bool) -> Self {
        match status {
            CallStatus::Pending if held_by_operator => BoardStatus::Processing,
            CallStatus::Pending => BoardStatus::Incoming,
            CallStatus::Dispatched => BoardStatus::Dispatched,
            CallStatus::EnRoute => BoardStatus::EnRoute,
            CallStatus::Arrived => BoardStatus::Arrived,
            CallStatus::InTransit => BoardStatus::InTransit,
            CallStatus::Completed => BoardStatus::Completed,
            CallStatus::Cancelled => BoardStatus::Cancelled,
        }
    }

    /// Underlying call status selected by a board filter.
    pub fn call_status(self) -> CallStatus {
        match self {
            BoardStatus::Incoming | BoardStatus::Processing => CallStatus::Pending,
            BoardStatus::Dispatched => CallStatus::Dispatched,
            BoardStatus::EnRoute => CallStatus::EnRoute,
            BoardStatus::Arrived => CallStatus::Arrived,
            BoardStatus::InTransit => CallStatus::InTransit,
            BoardStatus::Completed => CallStatus::Completed,
            BoardStatus::Cancelled => CallStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchCallView {
    pub id: CallId,
    pub call_number: String,
    pub caller_name: String,
    pub caller_phone: String,
    pub emergency_type: &'static str,
    pub severity: &'static str,
    pub location: String,
    pub coordinates: Coordinates,
    pub status: BoardStatus,
    pub priority: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_vehicle: Option<String>,
    pub call_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub notes: String,
    pub symptoms: Vec<String>,
    pub dispatch_notes: Vec<String>,
}

impl DispatchCallView {
    pub fn build(
        call: &Call,
        held_by_operator: bool,
        driver: Option<&Driver>,
        vehicle: Option<&Vehicle>,
    ) -> Self {
        let location = if call.caller.location.address.is_empty() {
            call.destination.address.clone().unwrap_or_default()
        } else {
            call.caller.location.address.clone()
        };
        let notes = if call.notes.is_empty() {
            call.emergency.description.clone()
        } else {
            call.notes.clone()
        };

        Self {
            id: call.id.clone(),
            call_number: call.call_number.clone(),
            caller_name: call.caller.name.clone(),
            caller_phone: call.caller.phone.clone(),
            emergency_type: call.emergency.emergency_type.label(),
            severity: call.emergency.estimated_severity.label(),
            location,
            coordinates: call.caller.location.coordinates,
            status: BoardStatus::of(call.status, held_by_operator),
            priority: call.emergency.priority.label(),
            assigned_driver: driver.map(Driver::full_name),
            assigned_vehicle: vehicle.map(|vehicle| {
                if vehicle.vehicle_number.is_empty() {
                    vehicle.name.clone()
                } else {
                    vehicle.vehicle_number.clone()
                }
            }),
            call_time: call.created_at,
            dispatch_time: call.dispatch.dispatched_at,
            estimated_arrival: call.dispatch.estimated_arrival,
            notes,
            symptoms: call.emergency.symptoms.clone(),
            dispatch_notes: call.dispatch.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorView {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub status: OperatorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_call: Option<String>,
    pub calls_handled: u32,
    pub average_response_time: f64,
}

impl OperatorView {
    /// `current_call_number` is the human-facing number of the held call, if it still exists.
    pub fn build(operator: &Operator, current_call_number: Option<String>) -> Self {
        Self {
            id: operator.id.0.clone(),
            user_id: operator.user.0.clone(),
            name: operator.name.clone(),
            status: operator.status,
            current_call: current_call_number,
            calls_handled: operator.calls_handled,
            average_response_time: operator.average_response_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    pub total_calls: usize,
    pub incoming_calls: usize,
    pub processing_calls: usize,
    pub dispatched_calls: usize,
    pub available_operators: usize,
    /// Mean minutes from call intake to dispatch, one decimal.
    pub average_response_time: f64,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_priority: BTreeMap<&'static str, usize>,
    pub by_type: BTreeMap<&'static str, usize>,
}
