// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rescue_dispatch::{CoreError, IncidentEvent, UpsertOutcome};
use rescue_dispatch_domain::{
    AssignmentStatus, Incident, IncidentPatch, IncidentStatus, NewDispatcher, RescuerStatus,
    Speaker, TranscriptChunk,
};

use crate::{ConfirmOutcome, IncidentChange, PersistenceError};

use super::{
    Fixture, T0, create_confirmed_incident, create_fixture, create_incident, is_not_found,
};

#[test]
fn test_accept_call_confirms_and_reassigns_dispatcher() {
    let mut fixture: Fixture = create_fixture();
    let incident: Incident = create_incident(&mut fixture, "CA-100");
    let other_dispatcher: i64 = fixture
        .persistence
        .create_dispatcher(
            &NewDispatcher {
                name: String::from("Marta Silva"),
                phone: None,
            },
            T0,
        )
        .unwrap()
        .dispatcher_id;

    let change: IncidentChange = fixture
        .persistence
        .apply_incident_event(
            incident.incident_id,
            IncidentEvent::AcceptCall {
                dispatcher_id: other_dispatcher,
            },
            T0 + 1,
        )
        .unwrap();

    assert!(change.changed);
    assert_eq!(change.incident.status, IncidentStatus::Confirmed);
    assert_eq!(change.incident.dispatcher_id, other_dispatcher);
    assert!(change.incident.last_updated > incident.last_updated);
}

#[test]
fn test_accept_call_twice_fails_precondition() {
    let mut fixture: Fixture = create_fixture();
    let incident: Incident = create_confirmed_incident(&mut fixture, "CA-100");

    let err: PersistenceError = fixture
        .persistence
        .apply_incident_event(
            incident.incident_id,
            IncidentEvent::AcceptCall {
                dispatcher_id: fixture.dispatcher_id,
            },
            T0 + 20,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Engine(CoreError::PreconditionFailed { .. })
    ));
}

#[test]
fn test_accept_call_requires_existing_dispatcher() {
    let mut fixture: Fixture = create_fixture();
    let incident: Incident = create_incident(&mut fixture, "CA-100");

    let err: PersistenceError = fixture
        .persistence
        .apply_incident_event(
            incident.incident_id,
            IncidentEvent::AcceptCall { dispatcher_id: 77 },
            T0 + 1,
        )
        .unwrap_err();
    assert!(is_not_found(&err, "dispatcher"));
    let stored: Incident = fixture.persistence.get_incident(incident.incident_id).unwrap();
    assert_eq!(stored.status, IncidentStatus::IncomingCall);
}

#[test]
fn test_event_on_missing_incident_is_not_found() {
    let mut fixture: Fixture = create_fixture();
    let err: PersistenceError = fixture
        .persistence
        .apply_incident_event(404, IncidentEvent::EndCall, T0)
        .unwrap_err();
    assert!(is_not_found(&err, "incident"));
}

#[test]
fn test_confirm_emergency_opens_exactly_one_offer() {
    let mut fixture: Fixture = create_fixture();
    let incident: Incident = create_confirmed_incident(&mut fixture, "CA-100");

    let first: ConfirmOutcome = fixture
        .persistence
        .confirm_emergency(incident.incident_id, T0 + 20)
        .unwrap();
    let second: ConfirmOutcome = fixture
        .persistence
        .confirm_emergency(incident.incident_id, T0 + 30)
        .unwrap();

    assert!(first.offer.created);
    assert!(!second.offer.created);
    assert_eq!(first.offer.assignment, second.offer.assignment);
    assert_eq!(first.incident.status, IncidentStatus::Confirmed);
    assert_eq!(
        fixture
            .persistence
            .list_assignments_for_incident(incident.incident_id)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_confirm_emergency_before_accepting_call_is_invalid() {
    let mut fixture: Fixture = create_fixture();
    let incident: Incident = create_incident(&mut fixture, "CA-100");

    let err: PersistenceError = fixture
        .persistence
        .confirm_emergency(incident.incident_id, T0 + 1)
        .unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Engine(CoreError::InvalidTransition { .. })
    ));
    assert!(
        fixture
            .persistence
            .list_assignments_for_incident(incident.incident_id)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_end_call_by_session_is_idempotent() {
    let mut fixture: Fixture = create_fixture();
    let incident: Incident = create_confirmed_incident(&mut fixture, "CA-100");

    let first: IncidentChange = fixture
        .persistence
        .end_call_by_session("CA-100", T0 + 50)
        .unwrap();
    let second: IncidentChange = fixture
        .persistence
        .end_call_by_session("CA-100", T0 + 60)
        .unwrap();

    assert!(first.changed);
    assert_eq!(first.incident.status, IncidentStatus::Completed);
    assert!(!second.changed);
    assert_eq!(second.incident, first.incident);
    assert_eq!(
        fixture
            .persistence
            .get_incident(incident.incident_id)
            .unwrap()
            .last_updated,
        first.incident.last_updated
    );
}

#[test]
fn test_end_call_for_unknown_session_is_not_found() {
    let mut fixture: Fixture = create_fixture();
    let err: PersistenceError = fixture
        .persistence
        .end_call_by_session("CA-missing", T0)
        .unwrap_err();
    assert!(is_not_found(&err, "incident"));
}

#[test]
fn test_cancel_terminal_incident_is_invalid() {
    let mut fixture: Fixture = create_fixture();
    let incident: Incident = create_incident(&mut fixture, "CA-100");
    fixture
        .persistence
        .apply_incident_event(incident.incident_id, IncidentEvent::EndCall, T0 + 1)
        .unwrap();

    let err: PersistenceError = fixture
        .persistence
        .apply_incident_event(incident.incident_id, IncidentEvent::Cancel, T0 + 2)
        .unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Engine(CoreError::InvalidTransition { .. })
    ));
}

#[test]
fn test_full_lifecycle() {
    let mut fixture: Fixture = create_fixture();
    let rescuer_id: i64 = fixture.rescuer_id;

    let created: Incident = fixture
        .persistence
        .upsert_incident(
            "CA-900",
            fixture.dispatcher_id,
            &IncidentPatch {
                address: Some(String::from("Los Leones 55")),
                ..IncidentPatch::default()
            },
            T0,
        )
        .unwrap()
        .incident()
        .clone();
    let id: i64 = created.incident_id;

    fixture
        .persistence
        .apply_incident_event(
            id,
            IncidentEvent::AcceptCall {
                dispatcher_id: fixture.dispatcher_id,
            },
            T0 + 1,
        )
        .unwrap();
    let confirmed: ConfirmOutcome = fixture.persistence.confirm_emergency(id, T0 + 2).unwrap();
    let assignment_id: i64 = confirmed.offer.assignment.assignment_id;

    let claim = fixture
        .persistence
        .accept_assignment(assignment_id, rescuer_id, T0 + 3)
        .unwrap();
    assert_eq!(claim.incident.status, IncidentStatus::RescuerAssigned);
    assert_eq!(claim.assignment.status, AssignmentStatus::Accepted);
    assert_eq!(claim.assignment.rescuer_id, Some(rescuer_id));
    assert_eq!(
        fixture.persistence.get_rescuer(rescuer_id).unwrap().status,
        RescuerStatus::OnCall
    );

    let ended: IncidentChange = fixture.persistence.end_call_by_session("CA-900", T0 + 4).unwrap();
    assert_eq!(ended.incident.status, IncidentStatus::Completed);

    let late: UpsertOutcome = fixture
        .persistence
        .upsert_incident(
            "CA-900",
            fixture.dispatcher_id,
            &IncidentPatch {
                address: Some(String::from("Somewhere else")),
                ..IncidentPatch::default()
            },
            T0 + 5,
        )
        .unwrap();
    assert!(matches!(late, UpsertOutcome::Frozen(_)));
    assert_eq!(
        fixture.persistence.get_incident(id).unwrap().address.as_deref(),
        Some("Los Leones 55")
    );
}

#[test]
fn test_out_of_order_facts() {
    let mut fixture: Fixture = create_fixture();

    // Transcript and extraction arrive interleaved with the dispatcher's
    // actions and out of offset order.
    let incident: Incident = create_incident(&mut fixture, "CA-300");
    let id: i64 = incident.incident_id;
    fixture
        .persistence
        .append_chunk(id, TranscriptChunk::new(4.0, Speaker::Caller, "no respira"), T0 + 1)
        .unwrap();
    fixture
        .persistence
        .apply_incident_event(
            id,
            IncidentEvent::AcceptCall {
                dispatcher_id: fixture.dispatcher_id,
            },
            T0 + 2,
        )
        .unwrap();
    fixture
        .persistence
        .upsert_incident(
            "CA-300",
            fixture.dispatcher_id,
            &IncidentPatch {
                breathing: Some(String::from("absent")),
                ..IncidentPatch::default()
            },
            T0 + 3,
        )
        .unwrap();
    fixture
        .persistence
        .append_chunk(id, TranscriptChunk::new(1.5, Speaker::Dispatcher, "¿Qué pasó?"), T0 + 4)
        .unwrap();

    let stored: Incident = fixture.persistence.get_incident(id).unwrap();
    assert_eq!(stored.status, IncidentStatus::Confirmed);
    assert_eq!(stored.breathing.as_deref(), Some("absent"));
    assert_eq!(stored.dispatcher_id, fixture.dispatcher_id);

    let call = fixture.persistence.get_call(id).unwrap();
    assert_eq!(call.transcription, "¿Qué pasó? no respira");
}
