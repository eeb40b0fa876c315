use ambulance_dispatch::error::AppError;
use ambulance_dispatch::store::InMemoryStore;
use ambulance_dispatch::workflows::dispatch::{
    load_roster, Driver, DriverId, HospitalId, Roster, StaffId, StaffMember, Vehicle, VehicleId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) const DEMO_HOSPITAL: &str = "hosp-demo";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store seeded from the CSV roster when one is configured, otherwise from [`demo_roster`].
pub(crate) fn seeded_store(roster_csv: Option<&Path>) -> Result<Arc<InMemoryStore>, AppError> {
    let store = InMemoryStore::new();
    let (roster, source) = match roster_csv {
        Some(path) => (load_roster(path)?, path.display().to_string()),
        None => (demo_roster(), "built-in demo roster".to_string()),
    };
    let loaded = store.load_roster(roster)?;
    info!(entries = loaded, %source, "roster loaded");
    Ok(Arc::new(store))
}

pub(crate) fn demo_roster() -> Roster {
    let hospital = HospitalId(DEMO_HOSPITAL.to_string());
    Roster {
        drivers: vec![
            Driver {
                id: DriverId("drv-demo-1".to_string()),
                hospital: hospital.clone(),
                first_name: "Dana".to_string(),
                last_name: "Reyes".to_string(),
                phone: "555-0101".to_string(),
                license_number: "EMT-4471".to_string(),
            },
            Driver {
                id: DriverId("drv-demo-2".to_string()),
                hospital: hospital.clone(),
                first_name: "Lee".to_string(),
                last_name: "Marsh".to_string(),
                phone: "555-0177".to_string(),
                license_number: "EMT-5120".to_string(),
            },
        ],
        vehicles: vec![Vehicle {
            id: VehicleId("veh-demo-1".to_string()),
            hospital: hospital.clone(),
            name: "Medic 12".to_string(),
            vehicle_type: "ambulance".to_string(),
            vehicle_number: "AMB-12".to_string(),
        }],
        staff: vec![StaffMember {
            id: StaffId("usr-demo-1".to_string()),
            hospital,
            first_name: "Sam".to_string(),
            last_name: "Okafor".to_string(),
            phone: "555-0199".to_string(),
        }],
    }
}
