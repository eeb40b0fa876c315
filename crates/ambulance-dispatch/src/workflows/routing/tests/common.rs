use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::config::DispatchConfig;
use crate::store::InMemoryStore;
use crate::workflows::dispatch::domain::{Coordinates, HospitalId, Location, Priority};
use crate::workflows::routing::domain::{
    AlertId, AlertSeverity, AlertStatus, AlertType, Measure, Route, RouteId, RouteLocation,
    RouteStatus, TrafficAlert, TrafficLevel,
};
use crate::workflows::routing::optimizer::{Savings, SavingsEstimator};
use crate::workflows::routing::requests::NewRoute;
use crate::workflows::routing::RouteService;

pub(crate) fn hospital() -> HospitalId {
    HospitalId("hosp-1".to_string())
}

fn location(name: &str, lat: f64, lng: f64) -> RouteLocation {
    RouteLocation {
        address: name.to_string(),
        coordinates: Coordinates { lat, lng },
        name: name.to_string(),
    }
}

/// Planned route stored directly, bypassing the service.
pub(crate) fn route(id: &str, hospital: &str) -> Route {
    let now = Utc::now();
    Route {
        id: RouteId(id.to_string()),
        hospital: HospitalId(hospital.to_string()),
        name: "Station 4 to Harborview".to_string(),
        start_location: location("Station 4", 47.62, -122.35),
        end_location: location("Harborview Medical Center", 47.60, -122.32),
        distance: Measure::kilometres(4.2),
        estimated_time: Measure::minutes(11.0),
        actual_time: None,
        traffic_level: TrafficLevel::Medium,
        priority: Priority::High,
        status: RouteStatus::Planned,
        assigned_driver: None,
        assigned_vehicle: None,
        related_call: None,
        waypoints: Vec::new(),
        traffic_alerts: Vec::new(),
        notes: String::new(),
        optimization: None,
        started_at: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn alert(id: &str, severity: AlertSeverity, expires_in: Duration) -> TrafficAlert {
    let now = Utc::now();
    TrafficAlert {
        id: AlertId(id.to_string()),
        hospital: hospital(),
        location: Location {
            address: "I-5 at Mercer".to_string(),
            coordinates: Coordinates::default(),
        },
        alert_type: AlertType::Accident,
        severity,
        description: "Multi-vehicle collision".to_string(),
        estimated_delay: Measure::minutes(12.0),
        status: AlertStatus::Active,
        reported_by: hospital(),
        expires_at: now + expires_in,
        created_at: now,
    }
}

/// Deterministic saving used in place of the randomized estimator.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedEstimator;

impl SavingsEstimator for FixedEstimator {
    fn estimate(&self, _route: &Route, _active_alerts: &[&TrafficAlert]) -> Savings {
        Savings {
            time_saved_minutes: 4.0,
            fuel_efficiency_gain: 10.0,
        }
    }
}

pub(crate) fn build_service() -> (RouteService<InMemoryStore, FixedEstimator>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let service =
        RouteService::with_estimator(store.clone(), FixedEstimator, DispatchConfig::default());
    (service, store)
}

pub(crate) fn new_route_payload() -> Value {
    json!({
        "name": "Station 4 to Harborview",
        "startLocation": "Station 4, 2801 Elliott Ave",
        "endLocation": {
            "address": "325 9th Ave",
            "name": "Harborview Medical Center",
            "coordinates": { "lat": 47.604, "lng": -122.323 }
        },
        "distance": { "value": 4.2, "unit": "km" },
        "priority": "high"
    })
}

pub(crate) fn new_route() -> NewRoute {
    serde_json::from_value(new_route_payload()).expect("valid route payload")
}
