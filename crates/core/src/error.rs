// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rescue_dispatch_domain::{DomainError, IncidentStatus};

/// Errors raised by the engine rules.
///
/// None of these are retried by the engine; callers decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input failed domain validation.
    DomainViolation(DomainError),
    /// The incident is not in the state the operation requires.
    PreconditionFailed {
        /// The incident the operation targeted.
        incident_id: i64,
        /// The status the incident was observed in.
        status: IncidentStatus,
        /// What the operation required.
        reason: &'static str,
    },
    /// The event is not a legal transition from the current state.
    InvalidTransition {
        /// The current status.
        from: String,
        /// The rejected event.
        event: &'static str,
    },
    /// Another rescuer already claimed the assignment.
    AlreadyClaimed {
        /// The contested assignment.
        assignment_id: i64,
    },
    /// A referenced record does not exist.
    NotFound {
        /// The kind of record.
        resource: &'static str,
        /// The identifier that was looked up.
        id: String,
    },
}

impl CoreError {
    /// Shorthand for a missing record addressed by numeric id.
    #[must_use]
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::PreconditionFailed {
                incident_id,
                status,
                reason,
            } => {
                write!(
                    f,
                    "Precondition failed for incident {incident_id} in status '{status}': {reason}"
                )
            }
            Self::InvalidTransition { from, event } => {
                write!(f, "Invalid transition: '{event}' is not allowed from '{from}'")
            }
            Self::AlreadyClaimed { assignment_id } => {
                write!(f, "Assignment {assignment_id} has already been claimed")
            }
            Self::NotFound { resource, id } => write!(f, "{resource} '{id}' not found"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
