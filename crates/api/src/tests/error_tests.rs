// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rescue_dispatch::CoreError;
use rescue_dispatch_domain::{DomainError, IncidentStatus};
use rescue_dispatch_persistence::PersistenceError;

use crate::{ApiError, translate_core_error, translate_domain_error, translate_persistence_error};

#[test]
fn test_domain_errors_become_invalid_input() {
    let err: ApiError = translate_domain_error(DomainError::InvalidSessionId(String::from("")));
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "call_session_id"));

    let err: ApiError = translate_domain_error(DomainError::InvalidId {
        entity: "dispatcher",
        id: 0,
    });
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "dispatcher_id"));

    let err: ApiError = translate_domain_error(DomainError::InvalidLimit { limit: 0, max: 500 });
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "limit"));
}

#[test]
fn test_rule_violations_keep_their_rule() {
    let precondition: ApiError = translate_core_error(CoreError::PreconditionFailed {
        incident_id: 4,
        status: IncidentStatus::Confirmed,
        reason: "incident must be an incoming call",
    });
    assert!(
        matches!(precondition, ApiError::DomainRuleViolation { ref rule, .. } if rule == "precondition")
    );

    let transition: ApiError = translate_core_error(CoreError::InvalidTransition {
        from: String::from("completed"),
        event: "cancel",
    });
    assert!(
        matches!(transition, ApiError::DomainRuleViolation { ref rule, .. } if rule == "invalid_transition")
    );
}

#[test]
fn test_already_claimed_is_a_conflict() {
    let err: ApiError = translate_core_error(CoreError::AlreadyClaimed { assignment_id: 9 });
    assert!(matches!(err, ApiError::Conflict { ref reason, .. } if reason == "already_claimed"));
}

#[test]
fn test_not_found_names_the_resource() {
    let err: ApiError = translate_core_error(CoreError::not_found("incident", 12));
    assert_eq!(
        err,
        ApiError::ResourceNotFound {
            resource_type: String::from("Incident"),
            message: String::from("incident '12' not found"),
        }
    );
}

#[test]
fn test_persistence_errors() {
    let engine: ApiError = translate_persistence_error(PersistenceError::Engine(
        CoreError::AlreadyClaimed { assignment_id: 1 },
    ));
    assert!(matches!(engine, ApiError::Conflict { .. }));

    let conflict: ApiError =
        translate_persistence_error(PersistenceError::WriteConflict(String::from("incident 1")));
    assert!(matches!(conflict, ApiError::Conflict { ref reason, .. } if reason == "write_conflict"));

    let internal: ApiError =
        translate_persistence_error(PersistenceError::QueryFailed(String::from("disk I/O error")));
    assert!(matches!(internal, ApiError::Internal { .. }));
}
