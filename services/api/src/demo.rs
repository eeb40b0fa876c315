use crate::infra::{seeded_store, DEMO_HOSPITAL};
use ambulance_dispatch::config::DispatchConfig;
use ambulance_dispatch::error::AppError;
use ambulance_dispatch::http::DateRange;
use ambulance_dispatch::store::InMemoryStore;
use ambulance_dispatch::workflows::dispatch::requests::{
    DispatchRequest, NewCall, OperatorUpsert, StatusChange,
};
use ambulance_dispatch::workflows::dispatch::{
    Call, DispatchService, DriverId, HospitalId, OperatorStatus, StaffId, VehicleId,
};
use ambulance_dispatch::workflows::routing::requests::{
    NewRoute, NewTrafficAlert, OptimizeRequest, RouteUpdate,
};
use ambulance_dispatch::workflows::routing::RouteService;
use ambulance_dispatch::workflows::WorkflowError;
use chrono::Local;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV roster to seed instead of the built-in demo crew
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Dispatch without registering an operator first
    #[arg(long)]
    pub(crate) skip_operator: bool,
    /// Skip the route optimization portion of the demo
    #[arg(long)]
    pub(crate) skip_routes: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        roster,
        skip_operator,
        skip_routes,
    } = args;

    let store = seeded_store(roster.as_deref())?;
    let hospital = HospitalId(DEMO_HOSPITAL.to_string());
    let dispatch = DispatchService::new(store.clone(), DispatchConfig::default());

    println!(
        "Ambulance dispatch demo ({})",
        Local::now().format("%Y-%m-%d %H:%M")
    );
    println!(
        "Hospital {} | ETA fallback {} min",
        hospital.0,
        dispatch.config().default_eta().num_minutes()
    );

    let operator = if skip_operator {
        println!("\nOperator registration skipped");
        None
    } else {
        let upsert = OperatorUpsert {
            user_id: Some(StaffId("usr-demo-1".to_string())),
            status: Some(OperatorStatus::Available),
            ..OperatorUpsert::default()
        };
        match dispatch.upsert_operator(&hospital, upsert) {
            Ok((operator, _)) => {
                println!(
                    "\nOperator {} ({}) is {}",
                    operator.name,
                    operator.id.0,
                    operator.status.label()
                );
                Some(operator)
            }
            Err(err) => {
                println!("\nOperator registration failed: {}", err);
                None
            }
        }
    };

    let intake: NewCall = match serde_json::from_value(json!({
        "caller": { "name": "Priya Natarajan", "phone": "555-0142", "relationship": "daughter" },
        "emergencyDetails": {
            "type": "cardiac",
            "priority": "critical",
            "severity": "high",
            "description": "Father collapsed, short of breath",
            "symptoms": ["chest pain", "shortness of breath"],
            "location": { "address": "410 Alder St", "coordinates": { "lat": 47.61, "lng": -122.33 } }
        },
        "patient": { "name": "Ravi Natarajan" }
    })) {
        Ok(intake) => intake,
        Err(err) => {
            println!("Demo call payload rejected: {}", err);
            return Ok(());
        }
    };

    let call = match dispatch.create_call(&hospital, intake) {
        Ok(call) => call,
        Err(err) => {
            println!("Call intake rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "\nReceived call {} ({} / {}) -> {}",
        call.call_number,
        call.emergency.emergency_type.label(),
        call.emergency.priority.label(),
        call.status
    );

    let crew = DispatchRequest {
        driver_id: Some(DriverId("drv-demo-1".to_string())),
        vehicle_id: Some(VehicleId("veh-demo-1".to_string())),
        operator_id: operator.as_ref().map(|operator| operator.id.clone()),
        ..DispatchRequest::default()
    };
    let mut call = match dispatch.dispatch(&hospital, &call.id, crew) {
        Ok(call) => call,
        Err(err) => {
            println!("Dispatch failed: {}", err);
            return Ok(());
        }
    };
    if let Some(eta) = call.dispatch.estimated_arrival {
        println!("Dispatched, estimated arrival {}", eta.format("%H:%M:%S"));
    }

    for (next, notes) in [
        ("en_route", None),
        ("arrived", Some("Crew on scene")),
        ("completed", Some("Treated on scene, transport declined")),
    ] {
        let change = StatusChange {
            status: Some(next.to_string()),
            notes: notes.map(str::to_string),
        };
        call = match dispatch.update_status(&hospital, &call.id, change) {
            Ok(call) => call,
            Err(err) => {
                println!("Status change to {} rejected: {}", next, err);
                return Ok(());
            }
        };
    }

    render_timeline(&call);

    if let Some(operator) = &operator {
        match dispatch.operators(&hospital, None) {
            Ok(views) => {
                for view in views.iter().filter(|view| view.id == operator.id.0) {
                    println!(
                        "\nOperator {} is {} after {} call(s), avg response {:.1} min",
                        view.name,
                        view.status.label(),
                        view.calls_handled,
                        view.average_response_time
                    );
                }
            }
            Err(err) => println!("\nOperator lookup unavailable: {}", err),
        }
    }

    match dispatch.stats(&hospital, DateRange::default()) {
        Ok(stats) => {
            println!("\nDispatch statistics");
            println!(
                "- {} total | {} incoming | {} processing | {} dispatched",
                stats.total_calls,
                stats.incoming_calls,
                stats.processing_calls,
                stats.dispatched_calls
            );
            println!(
                "- {} operator(s) available | {:.1} min average response",
                stats.available_operators, stats.average_response_time
            );
            for (status, count) in &stats.by_status {
                println!("  - {}: {}", status, count);
            }
        }
        Err(err) => println!("\nDispatch statistics unavailable: {}", err),
    }

    if skip_routes {
        return Ok(());
    }

    let routes = RouteService::new(store, DispatchConfig::default());
    if let Err(err) = run_route_demo(&routes, &hospital) {
        println!("\nRoute demo stopped: {}", err);
    }

    Ok(())
}

fn render_timeline(call: &Call) {
    println!("\nTimeline for {}", call.call_number);
    for entry in &call.timeline {
        match &entry.notes {
            Some(notes) => println!(
                "- {} {} ({})",
                entry.timestamp.format("%H:%M:%S"),
                entry.status,
                notes
            ),
            None => println!("- {} {}", entry.timestamp.format("%H:%M:%S"), entry.status),
        }
    }
}

fn run_route_demo(
    routes: &RouteService<InMemoryStore>,
    hospital: &HospitalId,
) -> Result<(), WorkflowError> {
    println!("\nRoute optimization demo");

    let alert: NewTrafficAlert = serde_json::from_value(json!({
        "location": "I-5 at Mercer St",
        "type": "accident",
        "severity": "high",
        "description": "Multi-vehicle collision blocking two lanes",
        "estimatedDelay": { "value": 12, "unit": "minutes" }
    }))
    .map_err(|err| WorkflowError::Validation(err.to_string()))?;
    let alert = routes.create_traffic_alert(hospital, alert)?;
    println!(
        "- Alert {} [{:?}] {}",
        alert.id.0,
        alert.severity,
        alert.description
    );

    let request: NewRoute = serde_json::from_value(json!({
        "name": "Station 4 to Harborview",
        "startLocation": "Station 4, 2801 Elliott Ave",
        "endLocation": {
            "address": "325 9th Ave",
            "name": "Harborview Medical Center",
            "coordinates": { "lat": 47.604, "lng": -122.323 }
        },
        "distance": { "value": 4.2, "unit": "km" },
        "priority": "high",
        "trafficAlerts": [alert.id.0]
    }))
    .map_err(|err| WorkflowError::Validation(err.to_string()))?;
    let route = routes.create_route(hospital, request)?;
    routes.update_route(
        hospital,
        &route.id,
        RouteUpdate {
            status: Some("active".to_string()),
            ..RouteUpdate::default()
        },
    )?;
    println!("- Route {} is active", route.name);

    let summary = routes.optimize(
        hospital,
        OptimizeRequest {
            criteria: vec!["traffic".to_string()],
            route_ids: Vec::new(),
        },
    )?;
    println!(
        "- {}/{} routes optimized | {:.1} min saved on average | {:.1}% fuel gain",
        summary.routes_optimized,
        summary.total_routes,
        summary.average_time_saved,
        summary.average_fuel_efficiency_gain
    );
    for result in &summary.results {
        println!(
            "  - {}: {:.1} min saved ({})",
            result.route_name,
            result.time_saved,
            if result.optimized { "rerouted" } else { "unchanged" }
        );
    }

    Ok(())
}
