use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::{json, Value};

use crate::config::DispatchConfig;
use crate::store::InMemoryStore;
use crate::workflows::dispatch::domain::{
    Call, CallId, Caller, DispatchDetails, Driver, DriverId, EmergencyDetails, HospitalId,
    Location, Operator, OperatorId, OperatorStatus, PatientSummary, StaffId, StaffMember,
    TimelineEntry, Vehicle, VehicleId,
};
use crate::workflows::dispatch::lifecycle::CallStatus;
use crate::workflows::dispatch::repository::{
    CallFilter, CallRepository, OperatorRepository, RepositoryError, RosterDirectory,
};
use crate::workflows::dispatch::requests::{DispatchRequest, NewCall, OperatorUpsert};
use crate::workflows::dispatch::DispatchService;

pub(crate) const DRIVER: &str = "drv-1";
pub(crate) const VEHICLE: &str = "veh-1";
pub(crate) const DISPATCHER: &str = "usr-1";

pub(crate) fn hospital() -> HospitalId {
    HospitalId("hosp-1".to_string())
}

/// Bare pending call record, for store-level tests that bypass the service.
pub(crate) fn call(id: &str, hospital: &str) -> Call {
    let now = Utc::now();
    let hospital = HospitalId(hospital.to_string());
    Call {
        id: CallId(id.to_string()),
        call_number: format!("CALL-{}-0001", now.timestamp_millis()),
        hospital: hospital.clone(),
        caller: Caller {
            name: "Priya Natarajan".to_string(),
            phone: "555-0142".to_string(),
            relationship: "daughter".to_string(),
            location: Location {
                address: "410 Alder St".to_string(),
                coordinates: Default::default(),
            },
        },
        patient: PatientSummary {
            name: "Ravi Natarajan".to_string(),
            condition: "Chest pain".to_string(),
            symptoms: None,
        },
        emergency: EmergencyDetails {
            emergency_type: Default::default(),
            priority: Default::default(),
            estimated_severity: Default::default(),
            description: "Chest pain".to_string(),
            symptoms: Vec::new(),
        },
        dispatch: DispatchDetails::default(),
        destination: Default::default(),
        medical_team: Default::default(),
        status: CallStatus::Pending,
        timeline: vec![TimelineEntry {
            status: CallStatus::Pending,
            timestamp: now,
            updated_by: hospital,
            notes: None,
        }],
        notes: String::new(),
        completed_at: None,
        created_at: now,
        updated_at: now,
        revision: 0,
    }
}

pub(crate) fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    store
        .add_driver(Driver {
            id: DriverId(DRIVER.to_string()),
            hospital: hospital(),
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            phone: "555-0101".to_string(),
            license_number: "EMT-4471".to_string(),
        })
        .expect("driver seeded");
    store
        .add_vehicle(Vehicle {
            id: VehicleId(VEHICLE.to_string()),
            hospital: hospital(),
            name: "Medic 12".to_string(),
            vehicle_type: "ambulance".to_string(),
            vehicle_number: "AMB-12".to_string(),
        })
        .expect("vehicle seeded");
    store
        .add_staff(StaffMember {
            id: StaffId(DISPATCHER.to_string()),
            hospital: hospital(),
            first_name: "Sam".to_string(),
            last_name: "Okafor".to_string(),
            phone: "555-0199".to_string(),
        })
        .expect("staff seeded");
    Arc::new(store)
}

pub(crate) fn build_service() -> (DispatchService<InMemoryStore>, Arc<InMemoryStore>) {
    let store = seeded_store();
    let service = DispatchService::new(store.clone(), DispatchConfig::default());
    (service, store)
}

pub(crate) fn new_call() -> NewCall {
    serde_json::from_value(new_call_payload()).expect("valid call payload")
}

pub(crate) fn new_call_payload() -> Value {
    json!({
        "caller": { "name": "Priya Natarajan", "phone": "555-0142", "relationship": "daughter" },
        "emergencyDetails": {
            "type": "cardiac",
            "priority": "critical",
            "severity": "high",
            "description": "Father collapsed, short of breath",
            "symptoms": ["chest pain", "shortness of breath"],
            "location": {
                "address": "410 Alder St",
                "coordinates": { "lat": 47.61, "lng": -122.33 }
            }
        },
        "patient": { "name": "Ravi Natarajan" }
    })
}

pub(crate) fn crew() -> DispatchRequest {
    DispatchRequest {
        driver_id: Some(DriverId(DRIVER.to_string())),
        vehicle_id: Some(VehicleId(VEHICLE.to_string())),
        ..DispatchRequest::default()
    }
}

pub(crate) fn available_operator(service: &DispatchService<InMemoryStore>) -> Operator {
    let (operator, created) = service
        .upsert_operator(
            &hospital(),
            OperatorUpsert {
                user_id: Some(StaffId(DISPATCHER.to_string())),
                status: Some(OperatorStatus::Available),
                ..OperatorUpsert::default()
            },
        )
        .expect("operator registered");
    assert!(created);
    operator
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose every operation fails, for 500 mapping tests.
pub(crate) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl CallRepository for UnavailableStore {
    fn insert_call(&self, _call: Call) -> Result<Call, RepositoryError> {
        offline()
    }

    fn update_call(&self, _call: Call) -> Result<Call, RepositoryError> {
        offline()
    }

    fn fetch_call(
        &self,
        _hospital: &HospitalId,
        _id: &CallId,
    ) -> Result<Option<Call>, RepositoryError> {
        offline()
    }

    fn find_calls(&self, _filter: &CallFilter) -> Result<Vec<Call>, RepositoryError> {
        offline()
    }
}

impl OperatorRepository for UnavailableStore {
    fn insert_operator(&self, _operator: Operator) -> Result<Operator, RepositoryError> {
        offline()
    }

    fn update_operator(&self, _operator: Operator) -> Result<Operator, RepositoryError> {
        offline()
    }

    fn fetch_operator(
        &self,
        _hospital: &HospitalId,
        _id: &OperatorId,
    ) -> Result<Option<Operator>, RepositoryError> {
        offline()
    }

    fn operator_for_user(
        &self,
        _hospital: &HospitalId,
        _user: &StaffId,
    ) -> Result<Option<Operator>, RepositoryError> {
        offline()
    }

    fn operators(
        &self,
        _hospital: &HospitalId,
        _status: Option<OperatorStatus>,
    ) -> Result<Vec<Operator>, RepositoryError> {
        offline()
    }
}

impl RosterDirectory for UnavailableStore {
    fn driver(
        &self,
        _hospital: &HospitalId,
        _id: &DriverId,
    ) -> Result<Option<Driver>, RepositoryError> {
        offline()
    }

    fn vehicle(
        &self,
        _hospital: &HospitalId,
        _id: &VehicleId,
    ) -> Result<Option<Vehicle>, RepositoryError> {
        offline()
    }

    fn staff(
        &self,
        _hospital: &HospitalId,
        _id: &StaffId,
    ) -> Result<Option<StaffMember>, RepositoryError> {
        offline()
    }
}
