// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use rescue_dispatch::CoreError;
use rescue_dispatch_domain::DomainError;
use rescue_dispatch_persistence::PersistenceError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A dispatch rule was violated (precondition or illegal transition).
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The operation lost a race against another writer.
    ///
    /// An already-claimed assignment is reported this way; clients treat
    /// it as an expected outcome.
    Conflict {
        /// Short machine-readable reason (`already_claimed`, `write_conflict`).
        reason: String,
        /// A human-readable description of the conflict.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { reason, message } => write!(f, "Conflict ({reason}): {message}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

fn invalid(field: &str, err: &DomainError) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Translates a domain error into an API error.
///
/// Every domain error is a validation failure on some input field.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match &err {
        DomainError::InvalidSessionId(_) => invalid("call_session_id", &err),
        DomainError::InvalidId { entity, .. } => invalid(&format!("{entity}_id"), &err),
        DomainError::InvalidChunkOffset(_) => invalid("offset", &err),
        DomainError::InvalidStatus { .. } => invalid("status", &err),
        DomainError::InvalidName { field } => invalid(field, &err),
        DomainError::InvalidCoordinates { .. } | DomainError::IncompleteCoordinates => {
            invalid("coordinates", &err)
        }
        DomainError::InvalidPatientAge(_) => invalid("age", &err),
        DomainError::InvalidLimit { .. } => invalid("limit", &err),
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::PreconditionFailed { .. } => ApiError::DomainRuleViolation {
            rule: String::from("precondition"),
            message: err.to_string(),
        },
        CoreError::InvalidTransition { .. } => ApiError::DomainRuleViolation {
            rule: String::from("invalid_transition"),
            message: err.to_string(),
        },
        CoreError::AlreadyClaimed { .. } => ApiError::Conflict {
            reason: String::from("already_claimed"),
            message: err.to_string(),
        },
        CoreError::NotFound { resource, .. } => ApiError::ResourceNotFound {
            resource_type: capitalize(resource),
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Engine rejections keep their meaning; store failures become `Internal`.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::Engine(core_err) => translate_core_error(core_err),
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message,
        },
        PersistenceError::WriteConflict(message) => ApiError::Conflict {
            reason: String::from("write_conflict"),
            message,
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
