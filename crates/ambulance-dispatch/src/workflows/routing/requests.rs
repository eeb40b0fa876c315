use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{
    AlertId, AlertSeverity, AlertType, Measure, RouteId, RouteLocation, TrafficLevel,
};
use crate::http::{deserialize_optional_datetime, DateRange, PageRequest};
use crate::workflows::dispatch::domain::{CallId, Coordinates, DriverId, Priority, VehicleId};

/// A location given either as a bare address or as a structured object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Address(String),
    Detailed {
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        coordinates: Option<Coordinates>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl LocationInput {
    /// Resolves against the previous value so omitted parts keep their old content.
    pub fn resolve(self, previous: Option<&RouteLocation>) -> RouteLocation {
        let (address, coordinates, name) = match self {
            LocationInput::Address(address) => (Some(address), None, None),
            LocationInput::Detailed {
                address,
                coordinates,
                name,
            } => (address, coordinates, name),
        };
        let address = address
            .filter(|a| !a.trim().is_empty())
            .or_else(|| previous.map(|p| p.address.clone()))
            .unwrap_or_default();
        let coordinates = coordinates
            .or_else(|| previous.map(|p| p.coordinates))
            .unwrap_or_default();
        let name = name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| (!address.is_empty()).then(|| address.clone()))
            .or_else(|| previous.map(|p| p.name.clone()))
            .unwrap_or_default();

        RouteLocation {
            address,
            coordinates,
            name,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            LocationInput::Address(address) => address.trim().is_empty(),
            LocationInput::Detailed { address, name, .. } => {
                address.as_deref().map_or(true, |a| a.trim().is_empty())
                    && name.as_deref().map_or(true, |n| n.trim().is_empty())
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoute {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_location: Option<LocationInput>,
    #[serde(default)]
    pub end_location: Option<LocationInput>,
    #[serde(default)]
    pub distance: Option<Measure>,
    #[serde(default)]
    pub estimated_time: Option<Measure>,
    #[serde(default)]
    pub traffic_level: Option<TrafficLevel>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assigned_driver: Option<DriverId>,
    #[serde(default)]
    pub assigned_vehicle: Option<VehicleId>,
    #[serde(default)]
    pub related_call: Option<CallId>,
    #[serde(default)]
    pub waypoints: Option<Vec<LocationInput>>,
    #[serde(default)]
    pub traffic_alerts: Option<Vec<AlertId>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial route update; `status` moves through the route transition table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_location: Option<LocationInput>,
    #[serde(default)]
    pub end_location: Option<LocationInput>,
    #[serde(default)]
    pub distance: Option<Measure>,
    #[serde(default)]
    pub estimated_time: Option<Measure>,
    #[serde(default)]
    pub actual_time: Option<Measure>,
    #[serde(default)]
    pub traffic_level: Option<TrafficLevel>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_driver: Option<DriverId>,
    #[serde(default)]
    pub assigned_vehicle: Option<VehicleId>,
    #[serde(default)]
    pub related_call: Option<CallId>,
    #[serde(default)]
    pub waypoints: Option<Vec<LocationInput>>,
    #[serde(default)]
    pub traffic_alerts: Option<Vec<AlertId>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub traffic_level: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl RouteQuery {
    pub fn created(&self) -> DateRange {
        DateRange {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    #[serde(default)]
    pub criteria: Vec<String>,
    #[serde(default)]
    pub route_ids: Vec<RouteId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrafficAlert {
    #[serde(default)]
    pub location: Option<LocationInput>,
    #[serde(rename = "type", default)]
    pub alert_type: Option<AlertType>,
    #[serde(default)]
    pub severity: Option<AlertSeverity>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_delay: Option<Measure>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub expires_at: Option<DateTime<Utc>>,
}
