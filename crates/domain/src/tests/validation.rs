// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    ActivePointer, ActivePointerPatch, DEFAULT_LIST_LIMIT, DomainError, MAX_LIST_LIMIT,
    NewPatient, Speaker, TranscriptChunk, resolve_limit, validate_coordinates, validate_id,
    validate_session_id,
};

#[test]
fn test_session_id_accepts_typical_identifiers() {
    assert!(validate_session_id("CA1234567890abcdef").is_ok());
    assert!(validate_session_id("call-2026-03-01_0001").is_ok());
}

#[test]
fn test_session_id_rejects_malformed_values() {
    assert!(matches!(
        validate_session_id(""),
        Err(DomainError::InvalidSessionId(_))
    ));
    assert!(matches!(
        validate_session_id("has space"),
        Err(DomainError::InvalidSessionId(_))
    ));
    assert!(matches!(
        validate_session_id(&"x".repeat(129)),
        Err(DomainError::InvalidSessionId(_))
    ));
}

#[test]
fn test_ids_must_be_positive() {
    assert!(validate_id("dispatcher", 1).is_ok());
    assert_eq!(
        validate_id("dispatcher", 0),
        Err(DomainError::InvalidId {
            entity: "dispatcher",
            id: 0
        })
    );
}

#[test]
fn test_chunk_offset_validation() {
    assert!(
        TranscriptChunk::new(0.0, Speaker::System, "Incoming call...")
            .validate()
            .is_ok()
    );
    assert!(
        TranscriptChunk::new(-0.5, Speaker::Caller, "hola")
            .validate()
            .is_err()
    );
    assert!(
        TranscriptChunk::new(f64::NAN, Speaker::Caller, "hola")
            .validate()
            .is_err()
    );
    assert!(
        TranscriptChunk::new(f64::INFINITY, Speaker::Caller, "hola")
            .validate()
            .is_err()
    );
}

#[test]
fn test_coordinates_range() {
    assert!(validate_coordinates(-33.45, -70.66).is_ok());
    assert!(validate_coordinates(91.0, 0.0).is_err());
    assert!(validate_coordinates(0.0, -181.0).is_err());
}

#[test]
fn test_resolve_limit() {
    assert_eq!(resolve_limit(None), Ok(DEFAULT_LIST_LIMIT));
    assert_eq!(resolve_limit(Some(25)), Ok(25));
    assert!(resolve_limit(Some(0)).is_err());
    assert!(resolve_limit(Some(MAX_LIST_LIMIT + 1)).is_err());
}

#[test]
fn test_patient_requires_names() {
    let patient: NewPatient = NewPatient {
        first_name: String::from("  "),
        last_name: String::from("Soto"),
        ..NewPatient::default()
    };
    assert_eq!(
        patient.validate(),
        Err(DomainError::InvalidName {
            field: "first_name"
        })
    );
}

#[test]
fn test_pointer_patch_tri_state() {
    let mut pointer: ActivePointer = ActivePointer::empty("global");
    pointer.active_incident_id = Some(3);
    pointer.active_dispatcher_id = Some(1);

    ActivePointerPatch {
        dispatcher_id: Some(2),
        incident_id: None,
    }
    .apply(&mut pointer);
    assert_eq!(pointer.active_dispatcher_id, Some(2));
    assert_eq!(pointer.active_incident_id, Some(3));

    ActivePointerPatch {
        dispatcher_id: None,
        incident_id: Some(None),
    }
    .apply(&mut pointer);
    assert_eq!(pointer.active_dispatcher_id, Some(2));
    assert_eq!(pointer.active_incident_id, None);
}
