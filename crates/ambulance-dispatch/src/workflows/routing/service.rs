use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::domain::{
    AlertId, AlertStatus, Measure, Route, RouteId, RouteLocation, RouteStatus, TrafficAlert,
};
use super::optimizer::{
    evaluate_route, summarize, OptimizationSummary, RandomizedTrafficEstimator, SavingsEstimator,
};
use super::repository::{AlertFilter, RouteFilter, RoutingStore};
use super::requests::{
    AlertQuery, LocationInput, NewRoute, NewTrafficAlert, OptimizeRequest, RouteQuery, RouteUpdate,
};
use crate::config::DispatchConfig;
use crate::http::{paginate, parse_filter, round_tenth, DateRange, Page};
use crate::workflows::dispatch::domain::{next_record_id, CallId, HospitalId, Location};
use crate::workflows::dispatch::repository::newest_first;
use crate::workflows::WorkflowError;

/// Service for planned ambulance routes and the traffic alerts that affect them.
pub struct RouteService<S, E = RandomizedTrafficEstimator> {
    store: Arc<S>,
    estimator: E,
    config: DispatchConfig,
}

impl<S> RouteService<S>
where
    S: RoutingStore + 'static,
{
    pub fn new(store: Arc<S>, config: DispatchConfig) -> Self {
        Self::with_estimator(store, RandomizedTrafficEstimator, config)
    }
}

impl<S, E> RouteService<S, E>
where
    S: RoutingStore + 'static,
    E: SavingsEstimator + 'static,
{
    pub fn with_estimator(store: Arc<S>, estimator: E, config: DispatchConfig) -> Self {
        Self {
            store,
            estimator,
            config,
        }
    }

    pub fn list_routes(
        &self,
        hospital: &HospitalId,
        query: &RouteQuery,
    ) -> Result<Page<Route>, WorkflowError> {
        let mut filter = RouteFilter::for_hospital(hospital);
        filter.status =
            parse_filter("status", query.status.as_deref()).map_err(WorkflowError::Validation)?;
        filter.priority = parse_filter("priority", query.priority.as_deref())
            .map_err(WorkflowError::Validation)?;
        filter.traffic_level = parse_filter("trafficLevel", query.traffic_level.as_deref())
            .map_err(WorkflowError::Validation)?;
        filter.created = query.created();

        let mut routes = self.store.find_routes(&filter)?;
        newest_first(&mut routes, |route| route.created_at);
        Ok(paginate(routes, query.page_request(), &self.config))
    }

    pub fn get_route(&self, hospital: &HospitalId, id: &RouteId) -> Result<Route, WorkflowError> {
        self.store
            .fetch_route(hospital, id)?
            .ok_or(WorkflowError::NotFound("Ambulance route"))
    }

    pub fn create_route(
        &self,
        hospital: &HospitalId,
        request: NewRoute,
    ) -> Result<Route, WorkflowError> {
        let name = request.name.filter(|name| !name.trim().is_empty());
        let start = request.start_location.filter(|l| !l.is_blank());
        let end = request.end_location.filter(|l| !l.is_blank());
        let (Some(name), Some(start), Some(end)) = (name, start, end) else {
            return Err(WorkflowError::Validation(
                "Missing required fields: name, startLocation, and endLocation are required"
                    .to_string(),
            ));
        };

        if let Some(call) = &request.related_call {
            self.ensure_call(hospital, call)?;
        }

        let now = Utc::now();
        let route = Route {
            id: RouteId(next_record_id("route")),
            hospital: hospital.clone(),
            name,
            start_location: start.resolve(None),
            end_location: end.resolve(None),
            distance: request.distance.unwrap_or_else(|| Measure::kilometres(0.0)),
            estimated_time: request.estimated_time.unwrap_or_else(|| Measure::minutes(0.0)),
            actual_time: None,
            traffic_level: request.traffic_level.unwrap_or_default(),
            priority: request.priority.unwrap_or_default(),
            status: RouteStatus::Planned,
            assigned_driver: request.assigned_driver,
            assigned_vehicle: request.assigned_vehicle,
            related_call: request.related_call,
            waypoints: resolve_all(request.waypoints),
            traffic_alerts: request.traffic_alerts.unwrap_or_default(),
            notes: request.notes.unwrap_or_default(),
            optimization: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_route(route)?;
        info!(route = %stored.id.0, "ambulance route planned");
        Ok(stored)
    }

    pub fn update_route(
        &self,
        hospital: &HospitalId,
        id: &RouteId,
        update: RouteUpdate,
    ) -> Result<Route, WorkflowError> {
        let mut route = self.get_route(hospital, id)?;
        let now = Utc::now();

        if let Some(raw) = update.status.as_deref() {
            let requested = parse_filter::<RouteStatus>("status", Some(raw))
                .ok()
                .flatten()
                .ok_or_else(|| {
                    WorkflowError::Validation(
                        "Invalid status. Must be one of: planned, active, completed".to_string(),
                    )
                })?;
            let next = route.status.transition(requested)?;
            if next != route.status {
                match next {
                    RouteStatus::Active => route.started_at = Some(now),
                    RouteStatus::Completed => route.completed_at = Some(now),
                    RouteStatus::Planned => {}
                }
                info!(
                    route = %route.id.0,
                    from = route.status.label(),
                    to = next.label(),
                    "route status changed"
                );
                route.status = next;
            }
        }

        if let Some(call) = &update.related_call {
            self.ensure_call(hospital, call)?;
            route.related_call = Some(call.clone());
        }
        if let Some(name) = update.name.filter(|name| !name.trim().is_empty()) {
            route.name = name;
        }
        if let Some(start) = update.start_location {
            route.start_location = start.resolve(Some(&route.start_location));
        }
        if let Some(end) = update.end_location {
            route.end_location = end.resolve(Some(&route.end_location));
        }
        if let Some(distance) = update.distance {
            route.distance = distance;
        }
        if let Some(estimated) = update.estimated_time {
            route.estimated_time = estimated;
        }
        if let Some(level) = update.traffic_level {
            route.traffic_level = level;
        }
        if let Some(priority) = update.priority {
            route.priority = priority;
        }
        if let Some(driver) = update.assigned_driver {
            route.assigned_driver = Some(driver);
        }
        if let Some(vehicle) = update.assigned_vehicle {
            route.assigned_vehicle = Some(vehicle);
        }
        if update.waypoints.is_some() {
            route.waypoints = resolve_all(update.waypoints);
        }
        if let Some(alerts) = update.traffic_alerts {
            route.traffic_alerts = alerts;
        }
        if let Some(notes) = update.notes {
            route.notes = notes;
        }

        match update.actual_time {
            Some(actual) => route.actual_time = Some(actual),
            None if route.status == RouteStatus::Completed && route.actual_time.is_none() => {
                route.actual_time = route.started_at.zip(route.completed_at).map(
                    |(started, completed)| {
                        Measure::minutes((completed - started).num_seconds() as f64 / 60.0)
                    },
                );
            }
            None => {}
        }

        route.updated_at = now;
        Ok(self.store.update_route(route)?)
    }

    pub fn delete_route(&self, hospital: &HospitalId, id: &RouteId) -> Result<(), WorkflowError> {
        self.store
            .delete_route(hospital, id)?
            .ok_or(WorkflowError::NotFound("Ambulance route"))?;
        info!(route = %id.0, "ambulance route deleted");
        Ok(())
    }

    /// Score active routes and persist the result on each one.
    pub fn optimize(
        &self,
        hospital: &HospitalId,
        request: OptimizeRequest,
    ) -> Result<OptimizationSummary, WorkflowError> {
        let mut filter = RouteFilter::for_hospital(hospital);
        filter.status = Some(RouteStatus::Active);
        filter.ids = Some(request.route_ids);

        let routes = self.store.find_routes(&filter)?;
        let now = Utc::now();
        let mut results = Vec::with_capacity(routes.len());

        for mut route in routes {
            let alerts = self.store.fetch_alerts(hospital, &route.traffic_alerts)?;
            let result = evaluate_route(&route, &alerts, &request.criteria, &self.estimator, now);
            route.optimization = Some(result.metadata(now));
            route.updated_at = now;
            self.store.update_route(route)?;
            results.push(result);
        }

        let summary = summarize(results);
        info!(
            routes = summary.total_routes,
            optimized = summary.routes_optimized,
            "route optimization pass finished"
        );
        Ok(summary)
    }

    pub fn stats(
        &self,
        hospital: &HospitalId,
        range: DateRange,
    ) -> Result<RouteStats, WorkflowError> {
        let mut filter = RouteFilter::for_hospital(hospital);
        filter.created = range;
        let routes = self.store.find_routes(&filter)?;

        let mut by_status = BTreeMap::new();
        let mut by_traffic = BTreeMap::new();
        for route in &routes {
            *by_status.entry(route.status.label()).or_insert(0) += 1;
            *by_traffic.entry(route.traffic_level.label()).or_insert(0) += 1;
        }

        let timed: Vec<f64> = routes
            .iter()
            .filter_map(|route| route.actual_time.as_ref().map(|t| t.value))
            .collect();
        let avg_response_time = if timed.is_empty() {
            0.0
        } else {
            round_tenth(timed.iter().sum::<f64>() / timed.len() as f64)
        };

        Ok(RouteStats {
            total: routes.len(),
            active_routes: by_status
                .get(RouteStatus::Active.label())
                .copied()
                .unwrap_or(0),
            by_status,
            by_traffic,
            avg_response_time,
        })
    }

    /// Alerts ordered by severity (highest first), then newest first.
    pub fn traffic_alerts(
        &self,
        hospital: &HospitalId,
        query: &AlertQuery,
    ) -> Result<Vec<TrafficAlert>, WorkflowError> {
        let status = parse_filter::<AlertStatus>("status", query.status.as_deref())
            .map_err(WorkflowError::Validation)?
            .unwrap_or(AlertStatus::Active);
        let filter = AlertFilter {
            hospital: hospital.clone(),
            alert_type: parse_filter("type", query.alert_type.as_deref())
                .map_err(WorkflowError::Validation)?,
            severity: parse_filter("severity", query.severity.as_deref())
                .map_err(WorkflowError::Validation)?,
        };

        let now = Utc::now();
        let mut alerts: Vec<TrafficAlert> = self
            .store
            .find_alerts(&filter)?
            .into_iter()
            .filter(|alert| alert.effective_status(now) == status)
            .map(|mut alert| {
                alert.status = alert.effective_status(now);
                alert
            })
            .collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(alerts)
    }

    pub fn create_traffic_alert(
        &self,
        hospital: &HospitalId,
        request: NewTrafficAlert,
    ) -> Result<TrafficAlert, WorkflowError> {
        let location = request.location.filter(|l| !l.is_blank());
        let description = request.description.filter(|d| !d.trim().is_empty());
        let (Some(location), Some(alert_type), Some(severity), Some(description)) =
            (location, request.alert_type, request.severity, description)
        else {
            return Err(WorkflowError::Validation(
                "Missing required fields: location, type, severity, and description are required"
                    .to_string(),
            ));
        };

        let now = Utc::now();
        let location = location.resolve(None);
        let alert = TrafficAlert {
            id: AlertId(next_record_id("alert")),
            hospital: hospital.clone(),
            location: Location {
                address: location.address,
                coordinates: location.coordinates,
            },
            alert_type,
            severity,
            description,
            estimated_delay: request
                .estimated_delay
                .unwrap_or_else(|| Measure::minutes(0.0)),
            status: AlertStatus::Active,
            reported_by: hospital.clone(),
            expires_at: request
                .expires_at
                .unwrap_or_else(|| now + self.config.alert_ttl()),
            created_at: now,
        };

        let stored = self.store.insert_alert(alert)?;
        info!(alert = %stored.id.0, severity = ?stored.severity, "traffic alert raised");
        Ok(stored)
    }

    fn ensure_call(&self, hospital: &HospitalId, call: &CallId) -> Result<(), WorkflowError> {
        self.store
            .fetch_call(hospital, call)?
            .map(|_| ())
            .ok_or(WorkflowError::NotFound("Ambulance call"))
    }
}

fn resolve_all(inputs: Option<Vec<LocationInput>>) -> Vec<RouteLocation> {
    inputs
        .unwrap_or_default()
        .into_iter()
        .map(|input| input.resolve(None))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_traffic: BTreeMap<&'static str, usize>,
    /// Mean of recorded actual route times.
    pub avg_response_time: f64,
    pub active_routes: usize,
}
