//! Emergency call lifecycle, crew dispatch and operator bookkeeping.

pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod requests;
pub mod roster;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    Call, CallId, Driver, DriverId, HospitalId, Operator, OperatorId, OperatorStatus, Priority,
    StaffId, StaffMember, TimelineEntry, Vehicle, VehicleId,
};
pub use lifecycle::{CallStatus, TransitionError};
pub use repository::{
    CallFilter, CallRepository, DispatchStore, OperatorRepository, RepositoryError,
    RosterDirectory,
};
pub use roster::{load_roster, parse_roster, Roster, RosterError};
pub use router::dispatch_router;
pub use service::DispatchService;
pub use views::{BoardStatus, DispatchCallView, DispatchStats, OperatorView};
