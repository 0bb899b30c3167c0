// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Incident status machine.
//!
//! ```text
//! incoming_call    --accept_call-->          confirmed
//! confirmed        --confirm_emergency-->    confirmed
//! confirmed        --assignment_accepted-->  rescuer_assigned
//! rescuer_assigned --assignment_accepted-->  rescuer_assigned
//! in_progress      --assignment_accepted-->  rescuer_assigned
//! any non-terminal --end_call-->             completed
//! any non-terminal --cancel-->               cancelled
//! ```
//!
//! `in_progress` is never entered by an engine event; it is accepted as a
//! source state wherever an active incident is.

use crate::error::CoreError;
use crate::upsert::next_stamp;
use rescue_dispatch_domain::{Incident, IncidentStatus, validate_id};

/// A dispatcher or arbitration action that may move an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentEvent {
    /// A dispatcher takes the incoming call.
    AcceptCall {
        /// The dispatcher taking ownership.
        dispatcher_id: i64,
    },
    /// The dispatcher confirms a real emergency.
    ConfirmEmergency,
    /// A rescuer claimed the incident's assignment.
    AssignmentAccepted,
    /// The call ended.
    EndCall,
    /// The incident was cancelled.
    Cancel,
}

impl IncidentEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AcceptCall { .. } => "accept_call",
            Self::ConfirmEmergency => "confirm_emergency",
            Self::AssignmentAccepted => "assignment_accepted",
            Self::EndCall => "end_call",
            Self::Cancel => "cancel",
        }
    }
}

/// Result of applying an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The incident changed; persist it.
    Changed(Incident),
    /// The event was an idempotent no-op.
    Unchanged,
}

fn invalid(incident: &Incident, event: IncidentEvent) -> CoreError {
    CoreError::InvalidTransition {
        from: incident.status.as_str().to_string(),
        event: event.name(),
    }
}

fn moved(incident: &Incident, status: IncidentStatus, now: i64) -> Incident {
    let mut next: Incident = incident.clone();
    next.status = status;
    next.last_updated = next_stamp(incident.last_updated, now);
    next
}

/// Applies an event to an incident.
///
/// # Arguments
///
/// * `incident` - The incident as currently stored
/// * `event` - The action to apply
/// * `now` - Current time, epoch milliseconds
///
/// # Errors
///
/// Returns an error if:
/// - `AcceptCall` targets an incident not in `incoming_call` (`PreconditionFailed`)
/// - the event is not legal from the current status (`InvalidTransition`)
pub fn apply_incident_event(
    incident: &Incident,
    event: IncidentEvent,
    now: i64,
) -> Result<Transition, CoreError> {
    let status: IncidentStatus = incident.status;
    match event {
        IncidentEvent::AcceptCall { dispatcher_id } => {
            validate_id("dispatcher", dispatcher_id)?;
            if status != IncidentStatus::IncomingCall {
                return Err(CoreError::PreconditionFailed {
                    incident_id: incident.incident_id,
                    status,
                    reason: "only an incoming call can be accepted",
                });
            }
            let mut next: Incident = moved(incident, IncidentStatus::Confirmed, now);
            next.dispatcher_id = dispatcher_id;
            Ok(Transition::Changed(next))
        }
        IncidentEvent::ConfirmEmergency => {
            if status == IncidentStatus::Confirmed {
                Ok(Transition::Unchanged)
            } else {
                Err(invalid(incident, event))
            }
        }
        IncidentEvent::AssignmentAccepted => {
            if status.is_active() {
                Ok(Transition::Changed(moved(
                    incident,
                    IncidentStatus::RescuerAssigned,
                    now,
                )))
            } else {
                Err(invalid(incident, event))
            }
        }
        IncidentEvent::EndCall => {
            if status.is_terminal() {
                Ok(Transition::Unchanged)
            } else {
                Ok(Transition::Changed(moved(
                    incident,
                    IncidentStatus::Completed,
                    now,
                )))
            }
        }
        IncidentEvent::Cancel => {
            if status.is_terminal() {
                Err(invalid(incident, event))
            } else {
                Ok(Transition::Changed(moved(
                    incident,
                    IncidentStatus::Cancelled,
                    now,
                )))
            }
        }
    }
}
