use super::common::*;

use crate::workflows::dispatch::domain::DriverId;
use crate::workflows::dispatch::lifecycle::CallStatus;
use crate::workflows::dispatch::requests::{DispatchRequest, StatusChange, TextList};
use crate::workflows::WorkflowError;

fn move_to(value: &str, notes: Option<&str>) -> StatusChange {
    StatusChange {
        status: Some(value.to_string()),
        notes: notes.map(str::to_string),
    }
}

#[test]
fn transport_path_records_every_step() {
    let (service, _) = build_service();
    let call = service.create_call(&hospital(), new_call()).expect("created");
    service.dispatch(&hospital(), &call.id, crew()).expect("dispatched");

    for next in ["en_route", "arrived", "in_transit"] {
        service
            .update_status(&hospital(), &call.id, move_to(next, None))
            .expect("step accepted");
    }
    let completed = service
        .update_status(
            &hospital(),
            &call.id,
            move_to("completed", Some("Handed over at ED bay 3")),
        )
        .expect("completed");

    let statuses: Vec<CallStatus> = completed.timeline.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            CallStatus::Pending,
            CallStatus::Dispatched,
            CallStatus::EnRoute,
            CallStatus::Arrived,
            CallStatus::InTransit,
            CallStatus::Completed,
        ]
    );
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.notes, "Handed over at ED bay 3");
    assert!(completed
        .timeline
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[test]
fn redispatch_replaces_crew_and_keeps_status() {
    let (service, store) = build_service();
    store
        .add_driver(crate::workflows::dispatch::domain::Driver {
            id: DriverId("drv-2".to_string()),
            hospital: hospital(),
            first_name: "Lee".to_string(),
            last_name: "Marsh".to_string(),
            phone: "555-0177".to_string(),
            license_number: "EMT-5120".to_string(),
        })
        .expect("second driver");

    let call = service.create_call(&hospital(), new_call()).expect("created");
    service.dispatch(&hospital(), &call.id, crew()).expect("dispatched");
    let redispatched = service
        .dispatch(
            &hospital(),
            &call.id,
            DispatchRequest {
                driver_id: Some(DriverId("drv-2".to_string())),
                notes: Some(TextList::One("First unit blocked by rail crossing".to_string())),
                ..DispatchRequest::default()
            },
        )
        .expect("re-dispatched");

    assert_eq!(redispatched.status, CallStatus::Dispatched);
    assert_eq!(redispatched.timeline.len(), 3);
    assert_eq!(redispatched.dispatch.driver, Some(DriverId("drv-2".to_string())));
    assert_eq!(
        redispatched.dispatch.vehicle.as_ref().map(|v| v.0.as_str()),
        Some(VEHICLE)
    );
    assert_eq!(
        redispatched.dispatch.notes,
        vec!["First unit blocked by rail crossing".to_string()]
    );
}

#[test]
fn en_route_calls_cannot_be_redispatched() {
    let (service, _) = build_service();
    let call = service.create_call(&hospital(), new_call()).expect("created");
    service.dispatch(&hospital(), &call.id, crew()).expect("dispatched");
    service
        .update_status(&hospital(), &call.id, move_to("en_route", None))
        .expect("en route");

    assert!(matches!(
        service.dispatch(&hospital(), &call.id, crew()),
        Err(WorkflowError::Transition(_))
    ));
}

#[test]
fn patients_in_transit_cannot_be_cancelled() {
    let (service, _) = build_service();
    let call = service.create_call(&hospital(), new_call()).expect("created");
    service.dispatch(&hospital(), &call.id, crew()).expect("dispatched");
    for next in ["en_route", "arrived", "in_transit"] {
        service
            .update_status(&hospital(), &call.id, move_to(next, None))
            .expect("step accepted");
    }

    match service.cancel(&hospital(), &call.id, None) {
        Err(WorkflowError::Validation(message)) => {
            assert_eq!(message, "Call cannot be cancelled once in_transit");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn calls_are_invisible_to_other_hospitals() {
    let (service, _) = build_service();
    let call = service.create_call(&hospital(), new_call()).expect("created");
    let other = crate::workflows::dispatch::domain::HospitalId("hosp-2".to_string());

    assert!(matches!(
        service.get_call(&other, &call.id),
        Err(WorkflowError::NotFound("Ambulance call"))
    ));
    assert!(matches!(
        service.dispatch(&other, &call.id, crew()),
        Err(WorkflowError::NotFound(_))
    ));
}
