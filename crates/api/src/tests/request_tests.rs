// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rescue_dispatch_domain::{ActivePointerPatch, Priority};

use crate::{UpdateActivePointerRequest, UpsertIncidentRequest};

#[test]
fn test_pointer_request_distinguishes_absent_from_null() {
    let absent: UpdateActivePointerRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(absent.active_incident_id, None);

    let cleared: UpdateActivePointerRequest =
        serde_json::from_str(r#"{"active_incident_id": null}"#).unwrap();
    assert_eq!(cleared.active_incident_id, Some(None));

    let set: UpdateActivePointerRequest =
        serde_json::from_str(r#"{"active_incident_id": 7, "active_dispatcher_id": 2}"#).unwrap();
    let patch: ActivePointerPatch = set.into();
    assert_eq!(patch.incident_id, Some(Some(7)));
    assert_eq!(patch.dispatcher_id, Some(2));
}

#[test]
fn test_pointer_request_rejects_unknown_fields() {
    let result: Result<UpdateActivePointerRequest, serde_json::Error> =
        serde_json::from_str(r#"{"incident": 7}"#);
    assert!(result.is_err());
}

#[test]
fn test_upsert_request_parses_partial_fields() {
    let request: UpsertIncidentRequest = serde_json::from_str(
        r#"{
            "call_session_id": "CA-42",
            "dispatcher_id": 1,
            "fields": {"priority": "critical", "address": "Av. Matta 1200"}
        }"#,
    )
    .unwrap();

    assert_eq!(request.fields.priority, Some(Priority::Critical));
    assert_eq!(request.fields.address.as_deref(), Some("Av. Matta 1200"));
    assert_eq!(request.fields.city, None);
}

#[test]
fn test_upsert_request_accepts_free_text_concierge_note() {
    let request: UpsertIncidentRequest = serde_json::from_str(
        r#"{
            "call_session_id": "CA-42",
            "dispatcher_id": 1,
            "fields": {"concierge_notified": "si, conserje avisado a las 14:05"}
        }"#,
    )
    .unwrap();

    assert_eq!(
        request.fields.concierge_notified.as_deref(),
        Some("si, conserje avisado a las 14:05")
    );
}

#[test]
fn test_upsert_request_rejects_unknown_incident_fields() {
    let result: Result<UpsertIncidentRequest, serde_json::Error> = serde_json::from_str(
        r#"{"call_session_id": "CA-42", "dispatcher_id": 1, "fields": {"blood_pressure": "120/80"}}"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_upsert_request_without_fields() {
    let request: UpsertIncidentRequest =
        serde_json::from_str(r#"{"call_session_id": "CA-42", "dispatcher_id": 1}"#).unwrap();
    assert_eq!(request.fields, rescue_dispatch_domain::IncidentPatch::default());
}
