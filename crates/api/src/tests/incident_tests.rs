// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rescue_dispatch_domain::{
    Incident, IncidentPatch, IncidentStatus, NewPatient, Patient, Priority, Speaker,
};

use crate::{
    AppendChunkRequest, AppendChunkResponse, ApiError, ConfirmEmergencyResponse, EndCallRequest,
    FindBySessionResponse, IncidentOverview, IncidentTransitionResponse, ListIncidentsQuery,
    ListIncidentsResponse, StartCallRequest, StartCallResponse, UpsertIncidentRequest,
    UpsertIncidentResponse, UpsertResult, append_chunk, cancel_incident, create_patient, end_call,
    find_by_session, get_incident, get_incident_overview, list_active, list_incidents,
    list_incoming, start_call, upsert_incident,
};

use super::helpers::{
    T0, TestContext, create_confirmed_incident, create_test_context, create_upsert_request,
};

#[test]
fn test_upsert_reports_created_then_merged() {
    let mut ctx: TestContext = create_test_context();
    let request: UpsertIncidentRequest = create_upsert_request(
        &ctx,
        "CA-200",
        IncidentPatch {
            priority: Some(Priority::High),
            ..IncidentPatch::default()
        },
    );

    let first: UpsertIncidentResponse =
        upsert_incident(&mut ctx.persistence, &request, T0).unwrap();
    assert_eq!(first.result, UpsertResult::Created);
    assert_eq!(first.status, IncidentStatus::IncomingCall);
    assert!(first.incident_number.starts_with("INC-2026-"));

    let second: UpsertIncidentResponse =
        upsert_incident(&mut ctx.persistence, &request, T0).unwrap();
    assert_eq!(second.result, UpsertResult::Merged);
    assert_eq!(second.incident_id, first.incident_id);
    assert!(second.last_updated > first.last_updated);
}

#[test]
fn test_upsert_on_closed_incident_is_unchanged() {
    let mut ctx: TestContext = create_test_context();
    let request: UpsertIncidentRequest =
        create_upsert_request(&ctx, "CA-201", IncidentPatch::default());
    let created: UpsertIncidentResponse =
        upsert_incident(&mut ctx.persistence, &request, T0).unwrap();
    cancel_incident(&mut ctx.persistence, created.incident_id, T0 + 1).unwrap();

    let late: UpsertIncidentRequest = create_upsert_request(
        &ctx,
        "CA-201",
        IncidentPatch {
            city: Some(String::from("Valparaíso")),
            ..IncidentPatch::default()
        },
    );
    let response: UpsertIncidentResponse =
        upsert_incident(&mut ctx.persistence, &late, T0 + 2).unwrap();
    assert_eq!(response.result, UpsertResult::Unchanged);
    assert_eq!(response.status, IncidentStatus::Cancelled);

    let incident: Incident = get_incident(&mut ctx.persistence, created.incident_id).unwrap();
    assert_eq!(incident.city, None);
}

#[test]
fn test_upsert_with_unknown_dispatcher_is_not_found() {
    let mut ctx: TestContext = create_test_context();
    let request: UpsertIncidentRequest = UpsertIncidentRequest {
        call_session_id: String::from("CA-202"),
        dispatcher_id: 77,
        fields: IncidentPatch::default(),
    };
    let err: ApiError = upsert_incident(&mut ctx.persistence, &request, T0).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound { .. }));
}

#[test]
fn test_upsert_with_blank_session_is_invalid_input() {
    let mut ctx: TestContext = create_test_context();
    let request: UpsertIncidentRequest =
        create_upsert_request(&ctx, " ", IncidentPatch::default());
    let err: ApiError = upsert_incident(&mut ctx.persistence, &request, T0).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "call_session_id"));
}

#[test]
fn test_call_start_and_end() {
    let mut ctx: TestContext = create_test_context();
    let (started, incident): (StartCallResponse, Incident) = start_call(
        &mut ctx.persistence,
        StartCallRequest {
            call_session_id: String::from("CA-300"),
            dispatcher_id: ctx.dispatcher_id,
            caller_phone: Some(String::from("+56 9 1111 2222")),
        },
        T0,
    )
    .unwrap();
    assert!(started.created);
    assert_eq!(incident.incident_id, started.incident_id);

    let found: FindBySessionResponse = find_by_session(&mut ctx.persistence, "CA-300").unwrap();
    assert!(found.found);
    assert!(found.has_call);
    assert_eq!(found.call_id, Some(started.call_id));

    let ended: IncidentTransitionResponse = end_call(
        &mut ctx.persistence,
        &EndCallRequest {
            call_session_id: String::from("CA-300"),
        },
        T0 + 5,
    )
    .unwrap();
    assert!(ended.changed);
    assert_eq!(ended.incident.status, IncidentStatus::Completed);

    let again: IncidentTransitionResponse = end_call(
        &mut ctx.persistence,
        &EndCallRequest {
            call_session_id: String::from("CA-300"),
        },
        T0 + 6,
    )
    .unwrap();
    assert!(!again.changed);
}

#[test]
fn test_list_filters() {
    let mut ctx: TestContext = create_test_context();
    let confirmed: ConfirmEmergencyResponse = create_confirmed_incident(&mut ctx, "CA-401");
    let request: UpsertIncidentRequest =
        create_upsert_request(&ctx, "CA-402", IncidentPatch::default());
    let incoming: UpsertIncidentResponse =
        upsert_incident(&mut ctx.persistence, &request, T0 + 10).unwrap();

    let incoming_list: ListIncidentsResponse = list_incoming(&mut ctx.persistence, None).unwrap();
    assert_eq!(incoming_list.incidents.len(), 1);
    assert_eq!(incoming_list.incidents[0].incident_id, incoming.incident_id);

    let active: ListIncidentsResponse = list_active(&mut ctx.persistence, None).unwrap();
    assert_eq!(active.incidents.len(), 1);
    assert_eq!(active.incidents[0].incident_id, confirmed.incident.incident_id);

    let both: ListIncidentsResponse = list_incidents(
        &mut ctx.persistence,
        &ListIncidentsQuery {
            status: Some(String::from("incoming_call, confirmed")),
            limit: Some(5),
        },
    )
    .unwrap();
    assert_eq!(both.incidents.len(), 2);
    assert_eq!(both.incidents[0].incident_id, incoming.incident_id);
}

#[test]
fn test_list_rejects_bad_query() {
    let mut ctx: TestContext = create_test_context();
    let bad_status: ApiError = list_incidents(
        &mut ctx.persistence,
        &ListIncidentsQuery {
            status: Some(String::from("open")),
            limit: None,
        },
    )
    .unwrap_err();
    assert!(matches!(bad_status, ApiError::InvalidInput { ref field, .. } if field == "status"));

    let bad_limit: ApiError = list_incoming(&mut ctx.persistence, Some(0)).unwrap_err();
    assert!(matches!(bad_limit, ApiError::InvalidInput { ref field, .. } if field == "limit"));
}

#[test]
fn test_overview_joins_satellites() {
    let mut ctx: TestContext = create_test_context();
    let patient: Patient = create_patient(
        &mut ctx.persistence,
        &NewPatient {
            first_name: String::from("Luis"),
            last_name: String::from("Paredes"),
            ..NewPatient::default()
        },
        T0,
    )
    .unwrap();
    let confirmed: ConfirmEmergencyResponse = create_confirmed_incident(&mut ctx, "CA-500");
    let incident_id: i64 = confirmed.incident.incident_id;
    let link: UpsertIncidentRequest = create_upsert_request(
        &ctx,
        "CA-500",
        IncidentPatch {
            patient_id: Some(patient.patient_id),
            ..IncidentPatch::default()
        },
    );
    upsert_incident(&mut ctx.persistence, &link, T0 + 3).unwrap();
    let appended: (AppendChunkResponse, _) = append_chunk(
        &mut ctx.persistence,
        incident_id,
        AppendChunkRequest {
            offset: 1.5,
            speaker: Speaker::Caller,
            text: String::from("se cayó en la escalera"),
        },
        T0 + 4,
    )
    .unwrap();
    assert_eq!(appended.0.chunk_count, 1);

    let overview: IncidentOverview = get_incident_overview(&mut ctx.persistence, incident_id).unwrap();
    assert_eq!(overview.incident.incident_id, incident_id);
    assert_eq!(
        overview.dispatcher.map(|d| d.dispatcher_id),
        Some(ctx.dispatcher_id)
    );
    assert_eq!(overview.patient.map(|p| p.patient_id), Some(patient.patient_id));
    assert_eq!(
        overview.call.map(|c| c.transcription),
        Some(String::from("se cayó en la escalera"))
    );
    assert_eq!(
        overview.assignment.map(|a| a.assignment_id),
        Some(confirmed.assignment.assignment_id)
    );
}

#[test]
fn test_overview_leaves_absent_satellites_empty() {
    let mut ctx: TestContext = create_test_context();
    let request: UpsertIncidentRequest =
        create_upsert_request(&ctx, "CA-501", IncidentPatch::default());
    let created: UpsertIncidentResponse =
        upsert_incident(&mut ctx.persistence, &request, T0).unwrap();

    let overview: IncidentOverview =
        get_incident_overview(&mut ctx.persistence, created.incident_id).unwrap();
    assert!(overview.dispatcher.is_some());
    assert_eq!(overview.patient, None);
    assert_eq!(overview.call, None);
    assert_eq!(overview.assignment, None);

    let missing: ApiError = get_incident_overview(&mut ctx.persistence, 999).unwrap_err();
    assert!(matches!(missing, ApiError::ResourceNotFound { .. }));
}

#[test]
fn test_append_chunk_rejects_negative_offset() {
    let mut ctx: TestContext = create_test_context();
    let err: ApiError = append_chunk(
        &mut ctx.persistence,
        1,
        AppendChunkRequest {
            offset: -0.5,
            speaker: Speaker::Dispatcher,
            text: String::from("hola"),
        },
        T0,
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "offset"));
}
