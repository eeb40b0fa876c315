use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::CallStatus;

/// Tenant identifier; every record belongs to exactly one hospital.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HospitalId(pub String);

/// Identifier wrapper for emergency calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(pub String);

/// Staff account (dispatcher, paramedic, nurse, doctor) owned by the user service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(pub String);

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CALL_NUMBER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique record identifier such as `call-000042`.
pub fn next_record_id(prefix: &str) -> String {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// Human-facing call number, `CALL-<unix millis>-<sequence>`.
pub fn next_call_number(now: DateTime<Utc>) -> String {
    let sequence = CALL_NUMBER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("CALL-{}-{sequence:04}", now.timestamp_millis())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    #[serde(default)]
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub name: String,
    pub phone: String,
    pub relationship: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub name: String,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyType {
    #[default]
    Medical,
    Trauma,
    Cardiac,
    Respiratory,
    Neurological,
    Pediatric,
    Obstetric,
    Psychiatric,
    Other,
}

impl EmergencyType {
    pub const fn label(self) -> &'static str {
        match self {
            EmergencyType::Medical => "medical",
            EmergencyType::Trauma => "trauma",
            EmergencyType::Cardiac => "cardiac",
            EmergencyType::Respiratory => "respiratory",
            EmergencyType::Neurological => "neurological",
            EmergencyType::Pediatric => "pediatric",
            EmergencyType::Obstetric => "obstetric",
            EmergencyType::Psychiatric => "psychiatric",
            EmergencyType::Other => "other",
        }
    }
}

/// Urgency shared by calls and routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// Clinical severity estimated by the call taker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    #[default]
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    /// Maps the caller-reported scale (`critical`/`high`/`medium`/...) onto clinical severity.
    pub fn from_reported(reported: Option<&str>) -> Self {
        match reported.map(str::trim) {
            Some("critical") => Severity::Critical,
            Some("high") => Severity::Severe,
            Some("medium") => Severity::Moderate,
            _ => Severity::Mild,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyDetails {
    #[serde(rename = "type")]
    pub emergency_type: EmergencyType,
    pub priority: Priority,
    pub estimated_severity: Severity,
    pub description: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    #[default]
    Hospital,
    Clinic,
    Home,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(rename = "type", default)]
    pub kind: DestinationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalTeam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paramedic: Option<StaffId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurse: Option<StaffId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<StaffId>,
}

/// Assignment sub-record; overwritten wholesale on every dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchDetails {
    pub vehicle: Option<VehicleId>,
    pub driver: Option<DriverId>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub en_route_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// One status-change event in a call's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub status: CallStatus,
    pub timestamp: DateTime<Utc>,
    pub updated_by: HospitalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A single emergency transport request tracked end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: CallId,
    pub call_number: String,
    pub hospital: HospitalId,
    pub caller: Caller,
    pub patient: PatientSummary,
    pub emergency: EmergencyDetails,
    pub dispatch: DispatchDetails,
    pub destination: Destination,
    pub medical_team: MedicalTeam,
    pub status: CallStatus,
    pub timeline: Vec<TimelineEntry>,
    pub notes: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every successful write.
    pub revision: u64,
}

impl Call {
    /// Records a status move and its timeline entry together.
    pub(crate) fn record_status(
        &mut self,
        status: CallStatus,
        updated_by: &HospitalId,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        self.updated_at = at;
        self.timeline.push(TimelineEntry {
            status,
            timestamp: at,
            updated_by: updated_by.clone(),
            notes,
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorStatus {
    Available,
    Busy,
    #[default]
    Offline,
}

impl OperatorStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OperatorStatus::Available => "available",
            OperatorStatus::Busy => "busy",
            OperatorStatus::Offline => "offline",
        }
    }
}

/// A dispatcher who receives and manages incoming calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: OperatorId,
    pub hospital: HospitalId,
    pub user: StaffId,
    pub name: String,
    pub status: OperatorStatus,
    pub current_call: Option<CallId>,
    pub calls_handled: u32,
    pub average_response_time: f64,
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_json::Value>,
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every successful write.
    pub revision: u64,
}

impl Operator {
    pub(crate) fn assign(&mut self, call: &CallId, at: DateTime<Utc>) {
        self.current_call = Some(call.clone());
        self.status = OperatorStatus::Busy;
        self.calls_handled = self.calls_handled.saturating_add(1);
        self.last_activity = Some(at);
        self.updated_at = at;
    }

    pub(crate) fn release(&mut self, at: DateTime<Utc>) {
        self.current_call = None;
        self.status = OperatorStatus::Available;
        self.last_activity = Some(at);
        self.updated_at = at;
    }
}

/// Ambulance driver registered with a hospital's fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: DriverId,
    pub hospital: HospitalId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub license_number: String,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: VehicleId,
    pub hospital: HospitalId,
    pub name: String,
    pub vehicle_type: String,
    pub vehicle_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: StaffId,
    pub hospital: HospitalId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl StaffMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
