//! Planned ambulance routes, traffic alerts and the placeholder optimizer.

pub mod domain;
pub mod optimizer;
pub mod repository;
pub mod requests;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    AlertId, AlertSeverity, AlertStatus, AlertType, Measure, Route, RouteId, RouteStatus,
    TrafficAlert, TrafficLevel,
};
pub use optimizer::{
    OptimizationSummary, RandomizedTrafficEstimator, RouteOptimizationResult, Savings,
    SavingsEstimator,
};
pub use repository::{AlertFilter, RouteFilter, RouteRepository, RoutingStore, TrafficAlertRepository};
pub use router::route_router;
pub use service::{RouteService, RouteStats};
