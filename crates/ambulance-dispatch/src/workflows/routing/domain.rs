use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::dispatch::domain::{
    CallId, Coordinates, DriverId, HospitalId, Location, Priority, VehicleId,
};
use crate::workflows::dispatch::lifecycle::TransitionError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    Active,
    Completed,
}

impl RouteStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RouteStatus::Planned => "planned",
            RouteStatus::Active => "active",
            RouteStatus::Completed => "completed",
        }
    }

    /// Re-asserting the current status is accepted as a no-op.
    pub fn transition(self, next: RouteStatus) -> Result<RouteStatus, TransitionError> {
        let allowed = self == next
            || matches!(
                (self, next),
                (RouteStatus::Planned, RouteStatus::Active)
                    | (RouteStatus::Planned, RouteStatus::Completed)
                    | (RouteStatus::Active, RouteStatus::Completed)
            );
        if allowed {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "route",
                from: self.label(),
                to: next.label(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    Low,
    #[default]
    Medium,
    High,
    Severe,
}

impl TrafficLevel {
    pub const fn label(self) -> &'static str {
        match self {
            TrafficLevel::Low => "low",
            TrafficLevel::Medium => "medium",
            TrafficLevel::High => "high",
            TrafficLevel::Severe => "severe",
        }
    }
}

/// Quantity with a unit, e.g. `{ value: 4.2, unit: "km" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub value: f64,
    pub unit: String,
}

impl Measure {
    pub fn kilometres(value: f64) -> Self {
        Self {
            value,
            unit: "km".to_string(),
        }
    }

    pub fn minutes(value: f64) -> Self {
        Self {
            value,
            unit: "minutes".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLocation {
    pub address: String,
    pub coordinates: Coordinates,
    pub name: String,
}

/// Outcome of the last optimization pass over a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptimization {
    pub time_saved: f64,
    pub fuel_efficiency_gain: f64,
    pub optimized: bool,
    pub optimized_at: DateTime<Utc>,
}

/// A planned path between two locations, optionally tied to a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: RouteId,
    pub hospital: HospitalId,
    pub name: String,
    pub start_location: RouteLocation,
    pub end_location: RouteLocation,
    pub distance: Measure,
    pub estimated_time: Measure,
    pub actual_time: Option<Measure>,
    pub traffic_level: TrafficLevel,
    pub priority: Priority,
    pub status: RouteStatus,
    pub assigned_driver: Option<DriverId>,
    pub assigned_vehicle: Option<VehicleId>,
    pub related_call: Option<CallId>,
    pub waypoints: Vec<RouteLocation>,
    pub traffic_alerts: Vec<AlertId>,
    pub notes: String,
    pub optimization: Option<RouteOptimization>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Accident,
    Construction,
    Congestion,
    RoadClosure,
    Weather,
    Event,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Resolved,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficAlert {
    pub id: AlertId,
    pub hospital: HospitalId,
    pub location: Location,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub description: String,
    pub estimated_delay: Measure,
    pub status: AlertStatus,
    pub reported_by: HospitalId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TrafficAlert {
    /// Stored status with expiry applied.
    pub fn effective_status(&self, now: DateTime<Utc>) -> AlertStatus {
        if self.status == AlertStatus::Active && self.expires_at <= now {
            AlertStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == AlertStatus::Active
    }
}
