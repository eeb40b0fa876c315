use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    next_call_number, next_record_id, Call, CallId, Caller, DispatchDetails, EmergencyDetails,
    HospitalId, Location, Operator, OperatorId, OperatorStatus, PatientSummary, Severity,
    TimelineEntry,
};
use super::lifecycle::CallStatus;
use super::repository::{newest_first, CallFilter, DispatchStore, RepositoryError};
use super::requests::{
    CallQuery, CallUpdate, DispatchRequest, NewCall, OperatorStatusChange, OperatorUpsert,
    StatusChange, TextList,
};
use super::views::{BoardStatus, DispatchCallView, DispatchStats, OperatorView};
use crate::config::DispatchConfig;
use crate::http::{paginate, parse_filter, round_tenth, DateRange, Page};
use crate::workflows::WorkflowError;

/// Upper bound on read-modify-write rounds for one operator update.
const OPERATOR_WRITE_ATTEMPTS: usize = 8;

/// Service driving calls through their lifecycle and keeping operators in step.
pub struct DispatchService<S> {
    store: Arc<S>,
    config: DispatchConfig,
}

impl<S> DispatchService<S>
where
    S: DispatchStore + 'static,
{
    pub fn new(store: Arc<S>, config: DispatchConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Register a new emergency call in `pending`.
    pub fn create_call(
        &self,
        hospital: &HospitalId,
        request: NewCall,
    ) -> Result<Call, WorkflowError> {
        let NewCall {
            caller,
            emergency_details,
            patient,
            destination,
            medical_team,
            notes,
        } = request;

        let (Some(caller), Some(emergency)) = (caller, emergency_details) else {
            return Err(WorkflowError::Validation(
                "Missing required fields: caller and emergencyDetails are required".to_string(),
            ));
        };

        let now = Utc::now();
        let notes = notes.unwrap_or_default();
        let raw_description = non_empty(emergency.description.clone());
        let description = raw_description.clone().unwrap_or_else(|| notes.clone());
        let emergency_type = emergency.emergency_type.unwrap_or_default();
        let symptoms = emergency
            .symptoms
            .map(TextList::into_vec)
            .unwrap_or_default();
        let destination = destination.unwrap_or_default();

        let (reported_address, reported_coordinates) = match emergency.location {
            Some(location) => (non_empty(location.address), location.coordinates),
            None => (None, None),
        };
        let address = reported_address
            .or_else(|| non_empty(destination.address.clone()))
            .or_else(|| raw_description.clone())
            .unwrap_or_else(|| "Location not specified".to_string());
        let coordinates = reported_coordinates
            .or(destination.coordinates)
            .unwrap_or_default();

        let caller_name = non_empty(caller.name).unwrap_or_else(|| "Unknown".to_string());
        let patient = patient.unwrap_or_default();
        let patient = PatientSummary {
            name: non_empty(patient.name).unwrap_or_else(|| caller_name.clone()),
            condition: non_empty(patient.condition)
                .or(raw_description)
                .unwrap_or_else(|| emergency_type.label().to_string()),
            symptoms: (!symptoms.is_empty()).then(|| symptoms.join(", ")),
        };

        let call = Call {
            id: CallId(next_record_id("call")),
            call_number: next_call_number(now),
            hospital: hospital.clone(),
            caller: Caller {
                name: caller_name,
                phone: caller.phone.unwrap_or_default(),
                relationship: non_empty(caller.relationship).unwrap_or_else(|| "self".to_string()),
                location: Location {
                    address,
                    coordinates,
                },
            },
            patient,
            emergency: EmergencyDetails {
                emergency_type,
                priority: emergency.priority.unwrap_or_default(),
                estimated_severity: Severity::from_reported(emergency.severity.as_deref()),
                description,
                symptoms,
            },
            dispatch: DispatchDetails::default(),
            destination,
            medical_team: medical_team.unwrap_or_default(),
            status: CallStatus::Pending,
            timeline: vec![TimelineEntry {
                status: CallStatus::Pending,
                timestamp: now,
                updated_by: hospital.clone(),
                notes: None,
            }],
            notes,
            completed_at: None,
            created_at: now,
            updated_at: now,
            revision: 0,
        };

        let stored = self.store.insert_call(call)?;
        info!(call = %stored.id.0, number = %stored.call_number, "ambulance call registered");
        Ok(stored)
    }

    pub fn get_call(&self, hospital: &HospitalId, id: &CallId) -> Result<Call, WorkflowError> {
        self.store
            .fetch_call(hospital, id)?
            .ok_or(WorkflowError::NotFound("Ambulance call"))
    }

    pub fn list_calls(
        &self,
        hospital: &HospitalId,
        query: &CallQuery,
    ) -> Result<Page<Call>, WorkflowError> {
        let mut filter = self.call_filter(hospital, query)?;
        filter.statuses = parse_filter::<CallStatus>("status", query.status.as_deref())
            .map_err(WorkflowError::Validation)?
            .map(|status| vec![status]);

        let mut calls = self.store.find_calls(&filter)?;
        newest_first(&mut calls, |call| call.created_at);
        Ok(paginate(calls, query.page_request(), &self.config))
    }

    /// Apply descriptive edits; status is only movable through the lifecycle operations.
    pub fn update_call(
        &self,
        hospital: &HospitalId,
        id: &CallId,
        update: CallUpdate,
    ) -> Result<Call, WorkflowError> {
        if update.status.is_some() {
            return Err(WorkflowError::Validation(
                "Call status cannot be changed by a generic update; use the dispatch, status or cancel operations"
                    .to_string(),
            ));
        }

        let mut call = self.get_call(hospital, id)?;

        if let Some(patch) = update.caller {
            if let Some(name) = non_empty(patch.name) {
                call.caller.name = name;
            }
            if let Some(phone) = patch.phone {
                call.caller.phone = phone;
            }
            if let Some(relationship) = non_empty(patch.relationship) {
                call.caller.relationship = relationship;
            }
            if let Some(location) = patch.location {
                call.caller.location = location;
            }
        }
        if let Some(patch) = update.emergency_details {
            if let Some(kind) = patch.emergency_type {
                call.emergency.emergency_type = kind;
            }
            if let Some(priority) = patch.priority {
                call.emergency.priority = priority;
            }
            if let Some(severity) = patch.estimated_severity {
                call.emergency.estimated_severity = severity;
            }
            if let Some(description) = patch.description {
                call.emergency.description = description;
            }
            if let Some(symptoms) = patch.symptoms {
                call.emergency.symptoms = symptoms.into_vec();
            }
        }
        if let Some(destination) = update.destination {
            call.destination = destination;
        }
        if let Some(team) = update.medical_team {
            call.medical_team = team;
        }
        if let Some(notes) = update.notes {
            call.notes = notes;
        }
        call.updated_at = Utc::now();

        Ok(self.store.update_call(call)?)
    }

    /// Assign crew and vehicle, moving the call to `dispatched`.
    ///
    /// Referenced driver and vehicle are validated before anything is written. The
    /// operator update happens after the call is saved and is not rolled back with it.
    pub fn dispatch(
        &self,
        hospital: &HospitalId,
        id: &CallId,
        request: DispatchRequest,
    ) -> Result<Call, WorkflowError> {
        let mut call = self.get_call(hospital, id)?;

        if let Some(driver) = &request.driver_id {
            self.store
                .driver(hospital, driver)?
                .ok_or(WorkflowError::NotFound("Driver"))?;
        }
        if let Some(vehicle) = &request.vehicle_id {
            self.store
                .vehicle(hospital, vehicle)?
                .ok_or(WorkflowError::NotFound("Vehicle"))?;
        }

        let next = call.status.transition(CallStatus::Dispatched)?;
        let now = Utc::now();
        let previous = std::mem::take(&mut call.dispatch);
        call.dispatch = DispatchDetails {
            vehicle: request.vehicle_id.or(previous.vehicle),
            driver: request.driver_id.or(previous.driver),
            dispatched_at: Some(now),
            estimated_arrival: Some(
                request
                    .estimated_arrival
                    .unwrap_or_else(|| now + self.config.default_eta()),
            ),
            en_route_at: None,
            arrived_at: None,
            actual_arrival: None,
            notes: request
                .notes
                .map(TextList::into_vec)
                .unwrap_or(previous.notes),
        };
        call.record_status(next, hospital, None, now);

        let stored = self.store.update_call(call)?;
        info!(
            call = %stored.id.0,
            driver = ?stored.dispatch.driver.as_ref().map(|d| &d.0),
            vehicle = ?stored.dispatch.vehicle.as_ref().map(|v| &v.0),
            "ambulance dispatched"
        );

        if let Some(operator_id) = &request.operator_id {
            self.assign_operator(hospital, operator_id, &stored.id, now)?;
        }

        Ok(stored)
    }

    /// Move a call along its lifecycle with the status-specific timestamps.
    pub fn update_status(
        &self,
        hospital: &HospitalId,
        id: &CallId,
        change: StatusChange,
    ) -> Result<Call, WorkflowError> {
        let requested = parse_filter::<CallStatus>("status", change.status.as_deref())
            .ok()
            .flatten()
            .ok_or_else(|| {
                let valid: Vec<&str> = CallStatus::ALL.iter().map(|s| s.label()).collect();
                WorkflowError::Validation(format!(
                    "Invalid status. Must be one of: {}",
                    valid.join(", ")
                ))
            })?;
        if requested == CallStatus::Dispatched {
            return Err(WorkflowError::Validation(
                "Use the dispatch operation to assign a crew to a call".to_string(),
            ));
        }

        let mut call = self.get_call(hospital, id)?;
        let next = call.status.transition(requested)?;
        let now = Utc::now();

        match next {
            CallStatus::EnRoute => {
                call.dispatch.en_route_at.get_or_insert(now);
            }
            CallStatus::Arrived => {
                if call.dispatch.arrived_at.is_none() {
                    call.dispatch.arrived_at = Some(now);
                    call.dispatch.actual_arrival = Some(now);
                }
            }
            CallStatus::Completed => call.completed_at = Some(now),
            _ => {}
        }
        if let Some(notes) = change.notes.as_ref().filter(|n| !n.trim().is_empty()) {
            call.notes = notes.clone();
        }
        call.record_status(next, hospital, change.notes, now);

        let stored = self.store.update_call(call)?;
        info!(call = %stored.id.0, status = %stored.status, "call status updated");

        if stored.status.is_terminal() {
            self.release_operators(hospital, &stored.id, now)?;
        }
        Ok(stored)
    }

    /// Cancel a call that has not reached a terminal state or left with the patient.
    pub fn cancel(
        &self,
        hospital: &HospitalId,
        id: &CallId,
        reason: Option<String>,
    ) -> Result<Call, WorkflowError> {
        let mut call = self.get_call(hospital, id)?;
        let next = call
            .status
            .transition(CallStatus::Cancelled)
            .map_err(|_| {
                WorkflowError::Validation(format!(
                    "Call cannot be cancelled once {}",
                    call.status
                ))
            })?;

        let now = Utc::now();
        let reason = non_empty(reason).unwrap_or_else(|| "Cancelled by dispatcher".to_string());
        call.record_status(next, hospital, Some(reason), now);

        let stored = self.store.update_call(call)?;
        info!(call = %stored.id.0, "call cancelled");
        self.release_operators(hospital, &stored.id, now)?;
        Ok(stored)
    }

    /// Dispatch board listing; board labels are accepted as the status filter.
    pub fn board(
        &self,
        hospital: &HospitalId,
        query: &CallQuery,
    ) -> Result<Page<DispatchCallView>, WorkflowError> {
        let board_status = parse_filter::<BoardStatus>("status", query.status.as_deref())
            .map_err(WorkflowError::Validation)?;
        let mut filter = self.call_filter(hospital, query)?;
        filter.statuses = board_status.map(|status| vec![status.call_status()]);

        let held = self.held_calls(hospital)?;
        let mut views = Vec::new();
        for call in self.store.find_calls(&filter)? {
            let driver = match &call.dispatch.driver {
                Some(id) => self.store.driver(hospital, id)?,
                None => None,
            };
            let vehicle = match &call.dispatch.vehicle {
                Some(id) => self.store.vehicle(hospital, id)?,
                None => None,
            };
            let view =
                DispatchCallView::build(&call, held.contains(&call.id), driver.as_ref(), vehicle.as_ref());
            if board_status.map_or(true, |status| status == view.status) {
                views.push(view);
            }
        }

        newest_first(&mut views, |view| view.call_time);
        Ok(paginate(views, query.page_request(), &self.config))
    }

    pub fn stats(
        &self,
        hospital: &HospitalId,
        range: DateRange,
    ) -> Result<DispatchStats, WorkflowError> {
        let mut filter = CallFilter::for_hospital(hospital);
        filter.created = range;
        let calls = self.store.find_calls(&filter)?;
        let operators = self.store.operators(hospital, None)?;
        let held = self.held_calls(hospital)?;

        let count = |status: CallStatus| calls.iter().filter(|c| c.status == status).count();
        let processing = calls
            .iter()
            .filter(|c| c.status == CallStatus::Pending && held.contains(&c.id))
            .count();

        let mut by_status = BTreeMap::new();
        let mut by_priority = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        for call in &calls {
            *by_status.entry(call.status.label()).or_insert(0) += 1;
            *by_priority.entry(call.emergency.priority.label()).or_insert(0) += 1;
            *by_type
                .entry(call.emergency.emergency_type.label())
                .or_insert(0) += 1;
        }

        let response_minutes: Vec<f64> = calls
            .iter()
            .filter_map(|call| {
                call.dispatch
                    .dispatched_at
                    .map(|at| minutes_between(call.created_at, at))
            })
            .collect();
        let average_response_time = if response_minutes.is_empty() {
            0.0
        } else {
            round_tenth(response_minutes.iter().sum::<f64>() / response_minutes.len() as f64)
        };

        Ok(DispatchStats {
            total_calls: calls.len(),
            incoming_calls: count(CallStatus::Pending) - processing,
            processing_calls: processing,
            dispatched_calls: count(CallStatus::Dispatched) + count(CallStatus::EnRoute),
            available_operators: operators
                .iter()
                .filter(|op| op.status == OperatorStatus::Available)
                .count(),
            average_response_time,
            by_status,
            by_priority,
            by_type,
        })
    }

    /// Operators ordered by status, then by calls handled descending.
    pub fn operators(
        &self,
        hospital: &HospitalId,
        status: Option<&str>,
    ) -> Result<Vec<OperatorView>, WorkflowError> {
        let status = parse_filter::<OperatorStatus>("status", status)
            .map_err(WorkflowError::Validation)?;
        let mut operators = self.store.operators(hospital, status)?;
        operators.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then(b.calls_handled.cmp(&a.calls_handled))
        });

        operators
            .iter()
            .map(|operator| -> Result<OperatorView, WorkflowError> {
                let number = match &operator.current_call {
                    Some(call) => self
                        .store
                        .fetch_call(hospital, call)?
                        .map(|call| call.call_number),
                    None => None,
                };
                Ok(OperatorView::build(operator, number))
            })
            .collect()
    }

    /// Create the operator for a staff user, or update the existing one.
    ///
    /// Returns the stored operator and whether it was newly created.
    pub fn upsert_operator(
        &self,
        hospital: &HospitalId,
        request: OperatorUpsert,
    ) -> Result<(Operator, bool), WorkflowError> {
        let OperatorUpsert {
            user_id,
            name,
            status,
            preferences,
        } = request;
        let user_id = user_id
            .filter(|id| !id.0.trim().is_empty())
            .ok_or_else(|| WorkflowError::Validation("User ID is required".to_string()))?;
        let now = Utc::now();

        if let Some(mut operator) = self.store.operator_for_user(hospital, &user_id)? {
            if let Some(name) = non_empty(name) {
                operator.name = name;
            }
            if let Some(status) = status {
                operator.status = status;
            }
            if let Some(preferences) = preferences {
                operator.preferences.extend(preferences);
            }
            operator.last_activity = Some(now);
            operator.updated_at = now;
            let stored = self.store.update_operator(operator)?;
            return Ok((stored, false));
        }

        let user = self
            .store
            .staff(hospital, &user_id)?
            .ok_or(WorkflowError::NotFound("User"))?;
        let operator = Operator {
            id: OperatorId(next_record_id("operator")),
            hospital: hospital.clone(),
            user: user_id,
            name: non_empty(name).unwrap_or_else(|| user.full_name()),
            status: status.unwrap_or_default(),
            current_call: None,
            calls_handled: 0,
            average_response_time: 0.0,
            preferences: preferences.unwrap_or_default(),
            last_activity: None,
            created_at: now,
            updated_at: now,
            revision: 0,
        };
        let stored = self.store.insert_operator(operator)?;
        info!(operator = %stored.id.0, "dispatch operator registered");
        Ok((stored, true))
    }

    pub fn update_operator_status(
        &self,
        hospital: &HospitalId,
        id: &OperatorId,
        change: OperatorStatusChange,
    ) -> Result<Operator, WorkflowError> {
        let mut operator = self
            .store
            .fetch_operator(hospital, id)?
            .ok_or(WorkflowError::NotFound("Dispatch operator"))?;

        if let Some(status) = change.status {
            operator.status = status;
            if status != OperatorStatus::Busy && change.current_call.is_none() {
                operator.current_call = None;
            }
        }
        match change.current_call {
            Some(Some(call)) => {
                self.get_call(hospital, &call)?;
                operator.current_call = Some(call);
            }
            Some(None) => operator.current_call = None,
            None => {}
        }

        let now = Utc::now();
        operator.last_activity = Some(now);
        operator.updated_at = now;
        Ok(self.store.update_operator(operator)?)
    }

    fn assign_operator(
        &self,
        hospital: &HospitalId,
        operator_id: &OperatorId,
        call: &CallId,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        match self.modify_operator(hospital, operator_id, |operator| operator.assign(call, at))? {
            Some(stored) => info!(
                operator = %stored.id.0,
                call = %call.0,
                calls_handled = stored.calls_handled,
                "operator assigned"
            ),
            None => warn!(
                operator = %operator_id.0,
                call = %call.0,
                "operator not found; dispatch recorded without operator"
            ),
        }
        Ok(())
    }

    fn release_operators(
        &self,
        hospital: &HospitalId,
        call: &CallId,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        for operator in self.store.operators(hospital, None)? {
            if operator.current_call.as_ref() != Some(call) {
                continue;
            }
            let released = self.modify_operator(hospital, &operator.id, |operator| {
                if operator.current_call.as_ref() == Some(call) {
                    operator.release(at);
                }
            })?;
            if let Some(stored) = released {
                info!(operator = %stored.id.0, call = %call.0, "operator released");
            }
        }
        Ok(())
    }

    /// Reads the operator, applies `change` and writes it back, starting over
    /// from a fresh read whenever another writer bumped the revision first.
    fn modify_operator(
        &self,
        hospital: &HospitalId,
        id: &OperatorId,
        change: impl Fn(&mut Operator),
    ) -> Result<Option<Operator>, WorkflowError> {
        for _ in 0..OPERATOR_WRITE_ATTEMPTS {
            let Some(mut operator) = self.store.fetch_operator(hospital, id)? else {
                return Ok(None);
            };
            change(&mut operator);
            match self.store.update_operator(operator) {
                Ok(stored) => return Ok(Some(stored)),
                Err(RepositoryError::Conflict) => {
                    warn!(operator = %id.0, "operator changed concurrently; retrying write")
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(RepositoryError::Conflict.into())
    }

    fn held_calls(&self, hospital: &HospitalId) -> Result<HashSet<CallId>, RepositoryError> {
        Ok(self
            .store
            .operators(hospital, None)?
            .into_iter()
            .filter_map(|operator| operator.current_call)
            .collect())
    }

    fn call_filter(
        &self,
        hospital: &HospitalId,
        query: &CallQuery,
    ) -> Result<CallFilter, WorkflowError> {
        let mut filter = CallFilter::for_hospital(hospital);
        filter.priority = parse_filter("priority", query.priority.as_deref())
            .map_err(WorkflowError::Validation)?;
        filter.emergency_type = parse_filter("type", query.emergency_type.as_deref())
            .map_err(WorkflowError::Validation)?;
        filter.created = query.created();
        Ok(filter)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}
