//! Inbound payloads for the dispatch endpoints.
//!
//! Required fields are modelled as `Option` so the service can answer with the
//! envelope's 400 message instead of a bare extractor rejection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{
    CallId, Coordinates, Destination, DriverId, EmergencyType, Location, MedicalTeam,
    OperatorId, OperatorStatus, Priority, Severity, StaffId, VehicleId,
};
use crate::http::{deserialize_optional_datetime, DateRange, PageRequest};

/// Either a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    One(String),
    Many(Vec<String>),
}

impl TextList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TextList::One(value) if value.trim().is_empty() => Vec::new(),
            TextList::One(value) => vec![value],
            TextList::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCall {
    #[serde(default)]
    pub caller: Option<CallerInput>,
    #[serde(default)]
    pub emergency_details: Option<EmergencyInput>,
    #[serde(default)]
    pub patient: Option<PatientInput>,
    #[serde(default)]
    pub destination: Option<Destination>,
    #[serde(default)]
    pub medical_team: Option<MedicalTeam>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyInput {
    #[serde(rename = "type", default)]
    pub emergency_type: Option<EmergencyType>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Caller-reported scale, mapped through [`Severity::from_reported`].
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub symptoms: Option<TextList>,
    #[serde(default)]
    pub location: Option<LocationInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Partial update of descriptive call fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallUpdate {
    #[serde(default)]
    pub caller: Option<CallerPatch>,
    #[serde(default)]
    pub emergency_details: Option<EmergencyPatch>,
    #[serde(default)]
    pub destination: Option<Destination>,
    #[serde(default)]
    pub medical_team: Option<MedicalTeam>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Captured only to reject it; status moves have dedicated endpoints.
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyPatch {
    #[serde(rename = "type", default)]
    pub emergency_type: Option<EmergencyType>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub estimated_severity: Option<Severity>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub symptoms: Option<TextList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub vehicle_id: Option<VehicleId>,
    #[serde(default)]
    pub operator_id: Option<OperatorId>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub estimated_arrival: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<TextList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorUpsert {
    #[serde(default)]
    pub user_id: Option<StaffId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<OperatorStatus>,
    #[serde(default)]
    pub preferences: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorStatusChange {
    #[serde(default)]
    pub status: Option<OperatorStatus>,
    /// Absent leaves the assignment alone; `null` clears it.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub current_call: Option<Option<CallId>>,
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query string for call listings and the dispatch board.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(rename = "type", default)]
    pub emergency_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl CallQuery {
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
pub struct OperatorQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_call_distinguishes_absent_from_null() {
        let absent: OperatorStatusChange =
            serde_json::from_str(r#"{"status":"busy"}"#).expect("parses");
        assert_eq!(absent.current_call, None);

        let cleared: OperatorStatusChange =
            serde_json::from_str(r#"{"currentCall":null}"#).expect("parses");
        assert_eq!(cleared.current_call, Some(None));

        let assigned: OperatorStatusChange =
            serde_json::from_str(r#"{"currentCall":"call-000001"}"#).expect("parses");
        assert_eq!(
            assigned.current_call,
            Some(Some(CallId("call-000001".to_string())))
        );
    }

    #[test]
    fn symptoms_accept_string_or_list() {
        let input: EmergencyInput =
            serde_json::from_str(r#"{"symptoms":"chest pain"}"#).expect("parses");
        assert_eq!(
            input.symptoms.map(TextList::into_vec),
            Some(vec!["chest pain".to_string()])
        );

        let input: EmergencyInput =
            serde_json::from_str(r#"{"symptoms":["dizzy","pale"]}"#).expect("parses");
        assert_eq!(input.symptoms.map(TextList::into_vec).map(|s| s.len()), Some(2));
    }
}
