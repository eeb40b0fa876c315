//! Process-local store backing both workflows.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::workflows::dispatch::domain::{
    Call, CallId, Driver, DriverId, HospitalId, Operator, OperatorId, OperatorStatus, StaffId,
    StaffMember, Vehicle, VehicleId,
};
use crate::workflows::dispatch::repository::{
    CallFilter, CallRepository, OperatorRepository, RepositoryError, RosterDirectory,
};
use crate::workflows::dispatch::roster::Roster;
use crate::workflows::routing::domain::{AlertId, Route, RouteId, TrafficAlert};
use crate::workflows::routing::repository::{
    AlertFilter, RouteFilter, RouteRepository, TrafficAlertRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    calls: Mutex<HashMap<CallId, Call>>,
    operators: Mutex<HashMap<OperatorId, Operator>>,
    routes: Mutex<HashMap<RouteId, Route>>,
    alerts: Mutex<HashMap<AlertId, TrafficAlert>>,
    drivers: Mutex<HashMap<DriverId, Driver>>,
    vehicles: Mutex<HashMap<VehicleId, Vehicle>>,
    staff: Mutex<HashMap<StaffId, StaffMember>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_driver(&self, driver: Driver) -> Result<(), RepositoryError> {
        lock(&self.drivers)?.insert(driver.id.clone(), driver);
        Ok(())
    }

    pub fn add_vehicle(&self, vehicle: Vehicle) -> Result<(), RepositoryError> {
        lock(&self.vehicles)?.insert(vehicle.id.clone(), vehicle);
        Ok(())
    }

    pub fn add_staff(&self, member: StaffMember) -> Result<(), RepositoryError> {
        lock(&self.staff)?.insert(member.id.clone(), member);
        Ok(())
    }

    /// Replaces roster entries with the same ids; returns how many were loaded.
    pub fn load_roster(&self, roster: Roster) -> Result<usize, RepositoryError> {
        let count = roster.len();
        for driver in roster.drivers {
            self.add_driver(driver)?;
        }
        for vehicle in roster.vehicles {
            self.add_vehicle(vehicle)?;
        }
        for member in roster.staff {
            self.add_staff(member)?;
        }
        Ok(count)
    }
}

impl CallRepository for InMemoryStore {
    fn insert_call(&self, call: Call) -> Result<Call, RepositoryError> {
        let mut guard = lock(&self.calls)?;
        if guard.contains_key(&call.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(call.id.clone(), call.clone());
        Ok(call)
    }

    fn update_call(&self, mut call: Call) -> Result<Call, RepositoryError> {
        let mut guard = lock(&self.calls)?;
        let stored = guard
            .get_mut(&call.id)
            .filter(|stored| stored.hospital == call.hospital)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != call.revision {
            return Err(RepositoryError::Conflict);
        }
        call.revision += 1;
        *stored = call.clone();
        Ok(call)
    }

    fn fetch_call(
        &self,
        hospital: &HospitalId,
        id: &CallId,
    ) -> Result<Option<Call>, RepositoryError> {
        let guard = lock(&self.calls)?;
        Ok(guard.get(id).filter(|call| &call.hospital == hospital).cloned())
    }

    fn find_calls(&self, filter: &CallFilter) -> Result<Vec<Call>, RepositoryError> {
        let guard = lock(&self.calls)?;
        Ok(guard
            .values()
            .filter(|call| filter.matches(call))
            .cloned()
            .collect())
    }
}

impl OperatorRepository for InMemoryStore {
    fn insert_operator(&self, operator: Operator) -> Result<Operator, RepositoryError> {
        let mut guard = lock(&self.operators)?;
        let duplicate_user = guard
            .values()
            .any(|existing| existing.hospital == operator.hospital && existing.user == operator.user);
        if guard.contains_key(&operator.id) || duplicate_user {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(operator.id.clone(), operator.clone());
        Ok(operator)
    }

    fn update_operator(&self, mut operator: Operator) -> Result<Operator, RepositoryError> {
        let mut guard = lock(&self.operators)?;
        let stored = guard
            .get_mut(&operator.id)
            .filter(|stored| stored.hospital == operator.hospital)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != operator.revision {
            return Err(RepositoryError::Conflict);
        }
        operator.revision += 1;
        *stored = operator.clone();
        Ok(operator)
    }

    fn fetch_operator(
        &self,
        hospital: &HospitalId,
        id: &OperatorId,
    ) -> Result<Option<Operator>, RepositoryError> {
        let guard = lock(&self.operators)?;
        Ok(guard
            .get(id)
            .filter(|operator| &operator.hospital == hospital)
            .cloned())
    }

    fn operator_for_user(
        &self,
        hospital: &HospitalId,
        user: &StaffId,
    ) -> Result<Option<Operator>, RepositoryError> {
        let guard = lock(&self.operators)?;
        Ok(guard
            .values()
            .find(|operator| &operator.hospital == hospital && &operator.user == user)
            .cloned())
    }

    fn operators(
        &self,
        hospital: &HospitalId,
        status: Option<OperatorStatus>,
    ) -> Result<Vec<Operator>, RepositoryError> {
        let guard = lock(&self.operators)?;
        Ok(guard
            .values()
            .filter(|operator| &operator.hospital == hospital)
            .filter(|operator| status.map_or(true, |status| operator.status == status))
            .cloned()
            .collect())
    }
}

impl RosterDirectory for InMemoryStore {
    fn driver(
        &self,
        hospital: &HospitalId,
        id: &DriverId,
    ) -> Result<Option<Driver>, RepositoryError> {
        let guard = lock(&self.drivers)?;
        Ok(guard.get(id).filter(|d| &d.hospital == hospital).cloned())
    }

    fn vehicle(
        &self,
        hospital: &HospitalId,
        id: &VehicleId,
    ) -> Result<Option<Vehicle>, RepositoryError> {
        let guard = lock(&self.vehicles)?;
        Ok(guard.get(id).filter(|v| &v.hospital == hospital).cloned())
    }

    fn staff(
        &self,
        hospital: &HospitalId,
        id: &StaffId,
    ) -> Result<Option<StaffMember>, RepositoryError> {
        let guard = lock(&self.staff)?;
        Ok(guard.get(id).filter(|s| &s.hospital == hospital).cloned())
    }
}

impl RouteRepository for InMemoryStore {
    fn insert_route(&self, route: Route) -> Result<Route, RepositoryError> {
        let mut guard = lock(&self.routes)?;
        if guard.contains_key(&route.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(route.id.clone(), route.clone());
        Ok(route)
    }

    fn update_route(&self, route: Route) -> Result<Route, RepositoryError> {
        let mut guard = lock(&self.routes)?;
        let stored = guard
            .get_mut(&route.id)
            .filter(|stored| stored.hospital == route.hospital)
            .ok_or(RepositoryError::NotFound)?;
        *stored = route.clone();
        Ok(route)
    }

    fn fetch_route(
        &self,
        hospital: &HospitalId,
        id: &RouteId,
    ) -> Result<Option<Route>, RepositoryError> {
        let guard = lock(&self.routes)?;
        Ok(guard.get(id).filter(|r| &r.hospital == hospital).cloned())
    }

    fn delete_route(
        &self,
        hospital: &HospitalId,
        id: &RouteId,
    ) -> Result<Option<Route>, RepositoryError> {
        let mut guard = lock(&self.routes)?;
        match guard.get(id) {
            Some(route) if &route.hospital == hospital => Ok(guard.remove(id)),
            _ => Ok(None),
        }
    }

    fn find_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, RepositoryError> {
        let guard = lock(&self.routes)?;
        Ok(guard
            .values()
            .filter(|route| filter.matches(route))
            .cloned()
            .collect())
    }
}

impl TrafficAlertRepository for InMemoryStore {
    fn insert_alert(&self, alert: TrafficAlert) -> Result<TrafficAlert, RepositoryError> {
        let mut guard = lock(&self.alerts)?;
        if guard.contains_key(&alert.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(alert.id.clone(), alert.clone());
        Ok(alert)
    }

    fn fetch_alerts(
        &self,
        hospital: &HospitalId,
        ids: &[AlertId],
    ) -> Result<Vec<TrafficAlert>, RepositoryError> {
        let guard = lock(&self.alerts)?;
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id))
            .filter(|alert| &alert.hospital == hospital)
            .cloned()
            .collect())
    }

    fn find_alerts(&self, filter: &AlertFilter) -> Result<Vec<TrafficAlert>, RepositoryError> {
        let guard = lock(&self.alerts)?;
        Ok(guard
            .values()
            .filter(|alert| alert.hospital == filter.hospital)
            .filter(|alert| filter.alert_type.map_or(true, |kind| alert.alert_type == kind))
            .filter(|alert| filter.severity.map_or(true, |severity| alert.severity == severity))
            .cloned()
            .collect())
    }
}
