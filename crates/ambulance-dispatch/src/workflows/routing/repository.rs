use super::domain::{
    AlertId, AlertSeverity, AlertType, Route, RouteId, RouteStatus, TrafficAlert, TrafficLevel,
};
use crate::http::DateRange;
use crate::workflows::dispatch::domain::{HospitalId, Priority};
use crate::workflows::dispatch::repository::{CallRepository, RepositoryError};

#[derive(Debug, Clone)]
pub struct RouteFilter {
    pub hospital: HospitalId,
    pub status: Option<RouteStatus>,
    pub priority: Option<Priority>,
    pub traffic_level: Option<TrafficLevel>,
    pub created: DateRange,
    /// Restricts the result to these routes when present and non-empty.
    pub ids: Option<Vec<RouteId>>,
}

impl RouteFilter {
    pub fn for_hospital(hospital: &HospitalId) -> Self {
        Self {
            hospital: hospital.clone(),
            status: None,
            priority: None,
            traffic_level: None,
            created: DateRange::default(),
            ids: None,
        }
    }

    pub fn matches(&self, route: &Route) -> bool {
        route.hospital == self.hospital
            && self.status.map_or(true, |status| route.status == status)
            && self.priority.map_or(true, |priority| route.priority == priority)
            && self
                .traffic_level
                .map_or(true, |level| route.traffic_level == level)
            && self.created.contains(route.created_at)
            && self
                .ids
                .as_ref()
                .filter(|ids| !ids.is_empty())
                .map_or(true, |ids| ids.contains(&route.id))
    }
}

/// Alert selector; `status` is compared after expiry is applied.
#[derive(Debug, Clone)]
pub struct AlertFilter {
    pub hospital: HospitalId,
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
}

pub trait RouteRepository: Send + Sync {
    fn insert_route(&self, route: Route) -> Result<Route, RepositoryError>;
    fn update_route(&self, route: Route) -> Result<Route, RepositoryError>;
    fn fetch_route(&self, hospital: &HospitalId, id: &RouteId)
        -> Result<Option<Route>, RepositoryError>;
    /// Removes and returns the route, or `None` when it did not exist.
    fn delete_route(&self, hospital: &HospitalId, id: &RouteId)
        -> Result<Option<Route>, RepositoryError>;
    fn find_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, RepositoryError>;
}

pub trait TrafficAlertRepository: Send + Sync {
    fn insert_alert(&self, alert: TrafficAlert) -> Result<TrafficAlert, RepositoryError>;
    fn fetch_alerts(
        &self,
        hospital: &HospitalId,
        ids: &[AlertId],
    ) -> Result<Vec<TrafficAlert>, RepositoryError>;
    fn find_alerts(&self, filter: &AlertFilter) -> Result<Vec<TrafficAlert>, RepositoryError>;
}

/// Everything the routing workflow reads or writes; calls are read to validate links.
pub trait RoutingStore: RouteRepository + TrafficAlertRepository + CallRepository {}

impl<T> RoutingStore for T where T: RouteRepository + TrafficAlertRepository + CallRepository {}
