// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Assignment broadcast and arbitration rules.
//!
//! The store enforces the single-winner guarantee with a conditional
//! update on `status = 'pending'`; these functions decide what the
//! winning write contains and what every other outcome means.

use crate::error::CoreError;
use rescue_dispatch_domain::{
    Assignment, AssignmentStatus, AssignmentTimes, DomainError, Incident, IncidentStatus,
    validate_id,
};
use std::str::FromStr;

/// What happens after a rescuer rejects a pending offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RejectPolicy {
    /// Leave the incident without an open offer until a dispatcher acts.
    #[default]
    AwaitDispatcher,
    /// Immediately broadcast a fresh offer for the same incident.
    Reoffer,
}

impl RejectPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitDispatcher => "await-dispatcher",
            Self::Reoffer => "reoffer",
        }
    }

    /// Returns true if a rejection of an offer on `incident` should be
    /// followed by a new offer.
    #[must_use]
    pub const fn reoffers_for(&self, incident: &Incident) -> bool {
        matches!(self, Self::Reoffer) && incident.status.is_active()
    }
}

impl FromStr for RejectPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "await-dispatcher" => Ok(Self::AwaitDispatcher),
            "reoffer" => Ok(Self::Reoffer),
            _ => Err(DomainError::InvalidStatus {
                kind: "reject policy",
                value: s.to_string(),
            }),
        }
    }
}

/// A response to a pending offer, or the close of an accepted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentEvent {
    Accept {
        /// The rescuer claiming the offer.
        rescuer_id: i64,
    },
    Reject,
    Cancel,
    Complete,
}

impl AssignmentEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "accept",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
        }
    }

    /// The status the assignment must be in for the event to apply.
    #[must_use]
    pub const fn required_status(&self) -> AssignmentStatus {
        match self {
            Self::Accept { .. } | Self::Reject | Self::Cancel => AssignmentStatus::Pending,
            Self::Complete => AssignmentStatus::Accepted,
        }
    }
}

/// Whether an offer request creates a new assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferDecision {
    /// An open assignment already exists; return it.
    Existing(Assignment),
    /// Insert a new pending assignment.
    Create(Assignment),
}

/// Builds a new unclaimed offer. The store assigns `assignment_id`.
#[must_use]
pub const fn new_offer(incident_id: i64, now: i64) -> Assignment {
    Assignment {
        assignment_id: 0,
        incident_id,
        rescuer_id: None,
        status: AssignmentStatus::Pending,
        times: AssignmentTimes {
            offered: now,
            responded: None,
            accepted: None,
            completed: None,
        },
    }
}

/// Decides whether to offer a new assignment for an incident.
///
/// # Arguments
///
/// * `incident` - The incident the offer is for
/// * `existing` - Every assignment recorded for the incident
/// * `now` - Current time, epoch milliseconds
///
/// # Errors
///
/// Returns `PreconditionFailed` if the incident is still an incoming call
/// or is terminal.
pub fn decide_offer(
    incident: &Incident,
    existing: &[Assignment],
    now: i64,
) -> Result<OfferDecision, CoreError> {
    if !incident.status.is_active() {
        return Err(CoreError::PreconditionFailed {
            incident_id: incident.incident_id,
            status: incident.status,
            reason: match incident.status {
                IncidentStatus::IncomingCall => "the call has not been accepted by a dispatcher",
                _ => "the incident is closed",
            },
        });
    }

    if let Some(open) = existing.iter().find(|a| a.status.is_open()) {
        return Ok(OfferDecision::Existing(open.clone()));
    }

    Ok(OfferDecision::Create(new_offer(incident.incident_id, now)))
}

/// Applies a response to an assignment.
///
/// # Errors
///
/// Returns an error if:
/// - `Accept` targets an assignment that is already accepted or completed
///   (`AlreadyClaimed`)
/// - the assignment is not in the status the event requires
///   (`InvalidTransition`)
pub fn apply_assignment_event(
    assignment: &Assignment,
    event: AssignmentEvent,
    now: i64,
) -> Result<Assignment, CoreError> {
    if let AssignmentEvent::Accept { rescuer_id } = event {
        validate_id("rescuer", rescuer_id)?;
        if matches!(
            assignment.status,
            AssignmentStatus::Accepted | AssignmentStatus::Completed
        ) {
            return Err(CoreError::AlreadyClaimed {
                assignment_id: assignment.assignment_id,
            });
        }
    }

    if assignment.status != event.required_status() {
        return Err(CoreError::InvalidTransition {
            from: assignment.status.as_str().to_string(),
            event: event.name(),
        });
    }

    let mut next: Assignment = assignment.clone();
    match event {
        AssignmentEvent::Accept { rescuer_id } => {
            next.status = AssignmentStatus::Accepted;
            next.rescuer_id = Some(rescuer_id);
            next.times.responded = Some(now);
            next.times.accepted = Some(now);
        }
        AssignmentEvent::Reject => {
            next.status = AssignmentStatus::Rejected;
            next.times.responded = Some(now);
        }
        AssignmentEvent::Cancel => {
            next.status = AssignmentStatus::Cancelled;
            next.times.responded = Some(now);
        }
        AssignmentEvent::Complete => {
            next.status = AssignmentStatus::Completed;
            next.times.completed = Some(now);
        }
    }
    Ok(next)
}

/// Filters assignments down to unclaimed offers, oldest first.
#[must_use]
pub fn pending_offers(assignments: &[Assignment]) -> Vec<Assignment> {
    let mut pending: Vec<Assignment> = assignments
        .iter()
        .filter(|a| a.status == AssignmentStatus::Pending)
        .cloned()
        .collect();
    pending.sort_by_key(|a| (a.times.offered, a.assignment_id));
    pending
}

/// The assignment to show for an incident: the open one if any, otherwise
/// the most recently offered.
#[must_use]
pub fn current_assignment(assignments: &[Assignment]) -> Option<&Assignment> {
    assignments
        .iter()
        .find(|a| a.status.is_open())
        .or_else(|| {
            assignments
                .iter()
                .max_by_key(|a| (a.times.offered, a.assignment_id))
        })
}
