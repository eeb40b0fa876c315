use chrono::{DateTime, Utc};

use super::domain::{
    Call, CallId, Driver, DriverId, EmergencyType, HospitalId, Operator, OperatorId,
    OperatorStatus, Priority, StaffId, StaffMember, Vehicle, VehicleId,
};
use super::lifecycle::CallStatus;
use crate::http::DateRange;

/// Document-store selector for calls; `None` fields do not constrain the result.
#[derive(Debug, Clone)]
pub struct CallFilter {
    pub hospital: HospitalId,
    pub statuses: Option<Vec<CallStatus>>,
    pub priority: Option<Priority>,
    pub emergency_type: Option<EmergencyType>,
    pub created: DateRange,
}

impl CallFilter {
    pub fn for_hospital(hospital: &HospitalId) -> Self {
        Self {
            hospital: hospital.clone(),
            statuses: None,
            priority: None,
            emergency_type: None,
            created: DateRange::default(),
        }
    }

    pub fn matches(&self, call: &Call) -> bool {
        call.hospital == self.hospital
            && self
                .statuses
                .as_ref()
                .map_or(true, |statuses| statuses.contains(&call.status))
            && self
                .priority
                .map_or(true, |priority| call.emergency.priority == priority)
            && self
                .emergency_type
                .map_or(true, |kind| call.emergency.emergency_type == kind)
            && self.created.contains(call.created_at)
    }
}

/// Storage abstraction for calls.
///
/// `update_call` is a compare-and-swap on [`Call::revision`]: the write succeeds only when
/// the stored revision equals the one carried by the record, and the stored copy is
/// returned with its revision bumped.
pub trait CallRepository: Send + Sync {
    fn insert_call(&self, call: Call) -> Result<Call, RepositoryError>;
    fn update_call(&self, call: Call) -> Result<Call, RepositoryError>;
    fn fetch_call(&self, hospital: &HospitalId, id: &CallId)
        -> Result<Option<Call>, RepositoryError>;
    fn find_calls(&self, filter: &CallFilter) -> Result<Vec<Call>, RepositoryError>;
}

pub trait OperatorRepository: Send + Sync {
    fn insert_operator(&self, operator: Operator) -> Result<Operator, RepositoryError>;
    fn update_operator(&self, operator: Operator) -> Result<Operator, RepositoryError>;
    fn fetch_operator(
        &self,
        hospital: &HospitalId,
        id: &OperatorId,
    ) -> Result<Option<Operator>, RepositoryError>;
    fn operator_for_user(
        &self,
        hospital: &HospitalId,
        user: &StaffId,
    ) -> Result<Option<Operator>, RepositoryError>;
    fn operators(
        &self,
        hospital: &HospitalId,
        status: Option<OperatorStatus>,
    ) -> Result<Vec<Operator>, RepositoryError>;
}

/// Read-only view of drivers, vehicles and staff owned by other services.
pub trait RosterDirectory: Send + Sync {
    fn driver(&self, hospital: &HospitalId, id: &DriverId)
        -> Result<Option<Driver>, RepositoryError>;
    fn vehicle(
        &self,
        hospital: &HospitalId,
        id: &VehicleId,
    ) -> Result<Option<Vehicle>, RepositoryError>;
    fn staff(&self, hospital: &HospitalId, id: &StaffId)
        -> Result<Option<StaffMember>, RepositoryError>;
}

/// Everything the dispatch workflow reads or writes.
pub trait DispatchStore: CallRepository + OperatorRepository + RosterDirectory {}

impl<T> DispatchStore for T where T: CallRepository + OperatorRepository + RosterDirectory {}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Newest first, the listing order used by every collection endpoint.
pub(crate) fn newest_first<T>(records: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    records.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}
