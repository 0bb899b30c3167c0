// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Handlers validate request shape, call into persistence, and translate
//! results into response DTOs. Every handler takes the clock reading as an
//! argument; callers obtain it from [`current_time_millis`].

use std::str::FromStr;

use rescue_dispatch::{
    IncidentEvent, RejectPolicy, UpsertOutcome, current_assignment, pending_offers,
};
use rescue_dispatch_domain::{
    Assignment, AssignmentStatus, CallRecord, Dispatcher, DomainError, Incident, IncidentStatus,
    NewDispatcher, NewPatient, NewRescuer, Patient, Rescuer, RescuerLocation, TranscriptChunk,
    resolve_limit, validate_id,
};
use rescue_dispatch_persistence::{
    CallStart, ClaimOutcome, ConfirmOutcome, IncidentChange, OfferOutcome, Persistence,
    PersistenceError, ResolveOutcome, SessionLookup,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::request_response::{
    AcceptAssignmentRequest, AcceptAssignmentResponse, AcceptCallRequest, ActivePointerResponse,
    AppendChunkRequest, AppendChunkResponse, ConfirmEmergencyResponse, EndCallRequest,
    FindBySessionResponse, IncidentOverview, IncidentTransitionResponse, ListAssignmentsResponse,
    ListDispatchersResponse, ListIncidentsQuery, ListIncidentsResponse, ListPatientsResponse,
    ListRescuersResponse, OfferAssignmentResponse, RejectAssignmentResponse,
    ReplaceTranscriptRequest, ServerTimeResponse, StartCallRequest, StartCallResponse,
    UpdateActivePointerRequest, UpsertIncidentRequest, UpsertIncidentResponse, UpsertResult,
};

/// Returns the current wall-clock time in epoch milliseconds.
#[must_use]
pub fn current_time_millis() -> i64 {
    let millis: i128 = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}

fn transition_response(change: IncidentChange) -> IncidentTransitionResponse {
    IncidentTransitionResponse {
        incident: change.incident,
        changed: change.changed,
    }
}

// ============================================================================
// Incident ingress
// ============================================================================

/// Merges extracted facts into the incident for a call session.
///
/// Creates the incident on first contact. A closed incident is left
/// untouched and reported as `unchanged`.
///
/// # Errors
///
/// Returns an error if:
/// - The session id or dispatcher id is malformed
/// - The dispatcher or a referenced patient does not exist
/// - A concurrent writer modified the incident
pub fn upsert_incident(
    persistence: &mut Persistence,
    request: &UpsertIncidentRequest,
    now: i64,
) -> Result<UpsertIncidentResponse, ApiError> {
    let outcome: UpsertOutcome = persistence
        .upsert_incident(
            &request.call_session_id,
            request.dispatcher_id,
            &request.fields,
            now,
        )
        .map_err(translate_persistence_error)?;

    let result: UpsertResult = match &outcome {
        UpsertOutcome::Created(_) => UpsertResult::Created,
        UpsertOutcome::Merged(_) => UpsertResult::Merged,
        UpsertOutcome::Frozen(_) => UpsertResult::Unchanged,
    };
    let incident: &Incident = outcome.incident();

    Ok(UpsertIncidentResponse {
        incident_id: incident.incident_id,
        incident_number: incident.incident_number.clone(),
        status: incident.status,
        result,
        last_updated: incident.last_updated,
    })
}

/// Records that a call reached the dispatch center.
///
/// Idempotent per session.
///
/// # Errors
///
/// Returns an error if the session id is malformed or the dispatcher
/// does not exist.
pub fn start_call(
    persistence: &mut Persistence,
    request: StartCallRequest,
    now: i64,
) -> Result<(StartCallResponse, Incident), ApiError> {
    let start: CallStart = persistence
        .start_incoming_call(
            &request.call_session_id,
            request.dispatcher_id,
            request.caller_phone,
            now,
        )
        .map_err(translate_persistence_error)?;

    if start.created {
        info!(
            incident_id = start.incident.incident_id,
            call_session_id = %request.call_session_id,
            "Incoming call registered"
        );
    }

    Ok((
        StartCallResponse {
            incident_id: start.incident.incident_id,
            incident_number: start.incident.incident_number.clone(),
            call_id: start.call.call_id,
            created: start.created,
        },
        start.incident,
    ))
}

/// Ends the call identified by its session.
///
/// # Errors
///
/// Returns an error if no incident exists for the session.
pub fn end_call(
    persistence: &mut Persistence,
    request: &EndCallRequest,
    now: i64,
) -> Result<IncidentTransitionResponse, ApiError> {
    persistence
        .end_call_by_session(&request.call_session_id, now)
        .map(transition_response)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Incident status
// ============================================================================

/// A dispatcher takes an incoming call.
///
/// # Errors
///
/// Returns an error if the incident or dispatcher does not exist, or the
/// incident is no longer an incoming call.
pub fn accept_call(
    persistence: &mut Persistence,
    incident_id: i64,
    request: AcceptCallRequest,
    now: i64,
) -> Result<IncidentTransitionResponse, ApiError> {
    persistence
        .apply_incident_event(
            incident_id,
            IncidentEvent::AcceptCall {
                dispatcher_id: request.dispatcher_id,
            },
            now,
        )
        .map(transition_response)
        .map_err(translate_persistence_error)
}

/// Confirms a real emergency and makes sure a rescue offer is open.
///
/// # Errors
///
/// Returns an error if the incident does not exist or has not been
/// accepted by a dispatcher.
pub fn confirm_emergency(
    persistence: &mut Persistence,
    incident_id: i64,
    now: i64,
) -> Result<ConfirmEmergencyResponse, ApiError> {
    let outcome: ConfirmOutcome = persistence
        .confirm_emergency(incident_id, now)
        .map_err(translate_persistence_error)?;

    Ok(ConfirmEmergencyResponse {
        incident: outcome.incident,
        assignment: outcome.offer.assignment,
        assignment_created: outcome.offer.created,
    })
}

/// The dispatcher ends the call. Ending a closed incident is a no-op.
///
/// # Errors
///
/// Returns an error if the incident does not exist.
pub fn end_incident_call(
    persistence: &mut Persistence,
    incident_id: i64,
    now: i64,
) -> Result<IncidentTransitionResponse, ApiError> {
    persistence
        .apply_incident_event(incident_id, IncidentEvent::EndCall, now)
        .map(transition_response)
        .map_err(translate_persistence_error)
}

/// Cancels an open incident.
///
/// # Errors
///
/// Returns an error if the incident does not exist or is already closed.
pub fn cancel_incident(
    persistence: &mut Persistence,
    incident_id: i64,
    now: i64,
) -> Result<IncidentTransitionResponse, ApiError> {
    persistence
        .apply_incident_event(incident_id, IncidentEvent::Cancel, now)
        .map(transition_response)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Incident reads
// ============================================================================

/// # Errors
///
/// Returns an error if the incident does not exist.
pub fn get_incident(persistence: &mut Persistence, incident_id: i64) -> Result<Incident, ApiError> {
    persistence
        .get_incident(incident_id)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the session id is malformed or unknown.
pub fn get_incident_by_session(
    persistence: &mut Persistence,
    call_session_id: &str,
) -> Result<Incident, ApiError> {
    persistence
        .get_incident_by_session(call_session_id)
        .map_err(translate_persistence_error)
}

/// Summarizes what is stored for a call session. Unknown sessions are
/// reported with `found: false`, not as an error.
///
/// # Errors
///
/// Returns an error if the session id is malformed.
pub fn find_by_session(
    persistence: &mut Persistence,
    call_session_id: &str,
) -> Result<FindBySessionResponse, ApiError> {
    let lookup: SessionLookup = persistence
        .find_by_session(call_session_id)
        .map_err(translate_persistence_error)?;

    Ok(FindBySessionResponse {
        found: lookup.found,
        incident_id: lookup.incident_id,
        call_id: lookup.call_id,
        has_call: lookup.has_call,
    })
}

fn parse_statuses(raw: Option<&str>) -> Result<Vec<IncidentStatus>, ApiError> {
    raw.map_or_else(
        || Ok(Vec::new()),
        |value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(IncidentStatus::from_str)
                .collect::<Result<Vec<IncidentStatus>, DomainError>>()
                .map_err(translate_domain_error)
        },
    )
}

/// Lists incidents newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns an error if a status or the limit is invalid.
pub fn list_incidents(
    persistence: &mut Persistence,
    query: &ListIncidentsQuery,
) -> Result<ListIncidentsResponse, ApiError> {
    let statuses: Vec<IncidentStatus> = parse_statuses(query.status.as_deref())?;
    resolve_limit(query.limit).map_err(translate_domain_error)?;

    let incidents: Vec<Incident> = persistence
        .list_incidents(&statuses, query.limit)
        .map_err(translate_persistence_error)?;
    Ok(ListIncidentsResponse { incidents })
}

/// Lists calls waiting for a dispatcher.
///
/// # Errors
///
/// Returns an error if the limit is invalid.
pub fn list_incoming(
    persistence: &mut Persistence,
    limit: Option<i64>,
) -> Result<ListIncidentsResponse, ApiError> {
    resolve_limit(limit).map_err(translate_domain_error)?;
    let incidents: Vec<Incident> = persistence
        .list_incidents(&[IncidentStatus::IncomingCall], limit)
        .map_err(translate_persistence_error)?;
    Ok(ListIncidentsResponse { incidents })
}

/// Lists incidents a rescue can be dispatched for.
///
/// # Errors
///
/// Returns an error if the limit is invalid.
pub fn list_active(
    persistence: &mut Persistence,
    limit: Option<i64>,
) -> Result<ListIncidentsResponse, ApiError> {
    resolve_limit(limit).map_err(translate_domain_error)?;
    let incidents: Vec<Incident> = persistence
        .list_incidents(&IncidentStatus::ACTIVE, limit)
        .map_err(translate_persistence_error)?;
    Ok(ListIncidentsResponse { incidents })
}

fn is_missing(err: &PersistenceError) -> bool {
    matches!(
        err,
        PersistenceError::NotFound(_)
            | PersistenceError::Engine(rescue_dispatch::CoreError::NotFound { .. })
    )
}

/// Keeps a satellite record if it could be read.
///
/// A missing record is expected and stays quiet; any other failure is
/// logged and the field is left empty.
fn satellite<T>(
    incident_id: i64,
    what: &'static str,
    result: Result<T, PersistenceError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if is_missing(&err) => {
            debug!(incident_id, what, "Overview satellite record absent");
            None
        }
        Err(err) => {
            warn!(incident_id, what, error = %err, "Failed to load overview satellite record");
            None
        }
    }
}

/// Reads an incident together with its dispatcher, patient, call and
/// current assignment.
///
/// # Errors
///
/// Returns an error only if the incident itself cannot be read.
pub fn get_incident_overview(
    persistence: &mut Persistence,
    incident_id: i64,
) -> Result<IncidentOverview, ApiError> {
    let incident: Incident = persistence
        .get_incident(incident_id)
        .map_err(translate_persistence_error)?;

    let dispatcher: Option<Dispatcher> = satellite(
        incident_id,
        "dispatcher",
        persistence.get_dispatcher(incident.dispatcher_id),
    );
    let patient: Option<Patient> = incident.patient_id.and_then(|patient_id| {
        satellite(incident_id, "patient", persistence.get_patient(patient_id))
    });
    let call: Option<CallRecord> =
        satellite(incident_id, "call", persistence.get_call(incident_id));
    let assignment: Option<Assignment> = satellite(
        incident_id,
        "assignment",
        persistence.list_assignments_for_incident(incident_id),
    )
    .and_then(|assignments| current_assignment(&assignments).cloned());

    Ok(IncidentOverview {
        incident,
        dispatcher,
        patient,
        call,
        assignment,
    })
}

/// Deletes an incident with its call and assignments.
///
/// # Errors
///
/// Returns an error if the incident does not exist.
pub fn delete_incident(persistence: &mut Persistence, incident_id: i64) -> Result<(), ApiError> {
    persistence
        .delete_incident(incident_id)
        .map_err(translate_persistence_error)?;
    info!(incident_id, "Incident deleted");
    Ok(())
}

// ============================================================================
// Transcript
// ============================================================================

/// # Errors
///
/// Returns an error if the incident or its call does not exist.
pub fn get_transcript(
    persistence: &mut Persistence,
    incident_id: i64,
) -> Result<CallRecord, ApiError> {
    persistence
        .get_call(incident_id)
        .map_err(translate_persistence_error)
}

/// Appends one transcript fragment, creating the call record if needed.
///
/// # Errors
///
/// Returns an error if the offset is invalid or the incident does not exist.
pub fn append_chunk(
    persistence: &mut Persistence,
    incident_id: i64,
    request: AppendChunkRequest,
    now: i64,
) -> Result<(AppendChunkResponse, CallRecord), ApiError> {
    let chunk: TranscriptChunk =
        TranscriptChunk::new(request.offset, request.speaker, request.text);
    chunk.validate().map_err(translate_domain_error)?;

    let call: CallRecord = persistence
        .append_chunk(incident_id, chunk, now)
        .map_err(translate_persistence_error)?;

    Ok((
        AppendChunkResponse {
            incident_id,
            call_id: call.call_id,
            chunk_count: call.chunks.len(),
            revision: call.revision,
        },
        call,
    ))
}

/// Overwrites an incident's transcript.
///
/// # Errors
///
/// Returns an error if any offset is invalid or the incident does not exist.
pub fn replace_transcript(
    persistence: &mut Persistence,
    incident_id: i64,
    request: ReplaceTranscriptRequest,
    now: i64,
) -> Result<CallRecord, ApiError> {
    for chunk in &request.chunks {
        chunk.validate().map_err(translate_domain_error)?;
    }
    persistence
        .replace_transcript(incident_id, request.chunks, request.caller_phone, now)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Assignments
// ============================================================================

/// Opens a rescue offer for a confirmed incident, or returns the open one.
///
/// # Errors
///
/// Returns an error if the incident does not exist or is not active.
pub fn offer_assignment(
    persistence: &mut Persistence,
    incident_id: i64,
    now: i64,
) -> Result<OfferAssignmentResponse, ApiError> {
    let outcome: OfferOutcome = persistence
        .offer_assignment(incident_id, now)
        .map_err(translate_persistence_error)?;

    Ok(OfferAssignmentResponse {
        assignment: outcome.assignment,
        created: outcome.created,
    })
}

/// A rescuer claims an offer. Exactly one concurrent claim wins.
///
/// # Errors
///
/// Returns `Conflict` with reason `already_claimed` if another rescuer won,
/// or an error if the assignment or rescuer does not exist.
pub fn accept_assignment(
    persistence: &mut Persistence,
    assignment_id: i64,
    request: AcceptAssignmentRequest,
    now: i64,
) -> Result<AcceptAssignmentResponse, ApiError> {
    let claim: ClaimOutcome = persistence
        .accept_assignment(assignment_id, request.rescuer_id, now)
        .map_err(translate_persistence_error)?;

    info!(
        assignment_id,
        rescuer_id = request.rescuer_id,
        incident_id = claim.incident.incident_id,
        "Assignment claimed"
    );
    Ok(AcceptAssignmentResponse {
        assignment: claim.assignment,
        incident: claim.incident,
    })
}

/// A rescuer declines an offer.
///
/// # Errors
///
/// Returns an error if the assignment does not exist or is not pending.
pub fn reject_assignment(
    persistence: &mut Persistence,
    assignment_id: i64,
    policy: RejectPolicy,
    now: i64,
) -> Result<RejectAssignmentResponse, ApiError> {
    let outcome: ResolveOutcome = persistence
        .reject_assignment(assignment_id, policy, now)
        .map_err(translate_persistence_error)?;

    Ok(RejectAssignmentResponse {
        assignment: outcome.assignment,
        reoffer: outcome.reoffer,
    })
}

/// Withdraws a pending offer.
///
/// # Errors
///
/// Returns an error if the assignment does not exist or is not pending.
pub fn cancel_assignment(
    persistence: &mut Persistence,
    assignment_id: i64,
    now: i64,
) -> Result<Assignment, ApiError> {
    persistence
        .cancel_assignment(assignment_id, now)
        .map_err(translate_persistence_error)
}

/// Closes an accepted assignment and frees the rescuer.
///
/// # Errors
///
/// Returns an error if the assignment does not exist or is not accepted.
pub fn complete_assignment(
    persistence: &mut Persistence,
    assignment_id: i64,
    now: i64,
) -> Result<Assignment, ApiError> {
    persistence
        .complete_assignment(assignment_id, now)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the incident does not exist.
pub fn list_incident_assignments(
    persistence: &mut Persistence,
    incident_id: i64,
) -> Result<ListAssignmentsResponse, ApiError> {
    let assignments: Vec<Assignment> = persistence
        .list_assignments_for_incident(incident_id)
        .map_err(translate_persistence_error)?;
    Ok(ListAssignmentsResponse { assignments })
}

/// # Errors
///
/// Returns an error if the rescuer does not exist.
pub fn list_rescuer_assignments(
    persistence: &mut Persistence,
    rescuer_id: i64,
) -> Result<ListAssignmentsResponse, ApiError> {
    let assignments: Vec<Assignment> = persistence
        .list_assignments_for_rescuer(rescuer_id)
        .map_err(translate_persistence_error)?;
    Ok(ListAssignmentsResponse { assignments })
}

/// Lists every open offer, oldest first.
///
/// Uses the status index; if that query fails, falls back to scanning all
/// assignments.
///
/// # Errors
///
/// Returns an error only if the fallback scan fails too.
pub fn list_pending_offers(
    persistence: &mut Persistence,
) -> Result<ListAssignmentsResponse, ApiError> {
    let assignments: Vec<Assignment> =
        match persistence.list_assignments(Some(AssignmentStatus::Pending)) {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "Indexed pending-offer query failed, scanning all assignments");
                let all: Vec<Assignment> = persistence
                    .list_assignments(None)
                    .map_err(translate_persistence_error)?;
                pending_offers(&all)
            }
        };
    Ok(ListAssignmentsResponse { assignments })
}

// ============================================================================
// Active pointer
// ============================================================================

/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn get_active_pointer(
    persistence: &mut Persistence,
    scope: &str,
) -> Result<ActivePointerResponse, ApiError> {
    persistence
        .get_active_pointer(scope)
        .map(ActivePointerResponse::from)
        .map_err(translate_persistence_error)
}

/// Patches the active pointer. Last writer wins.
///
/// # Errors
///
/// Returns an error if a referenced incident or dispatcher does not exist.
pub fn update_active_pointer(
    persistence: &mut Persistence,
    scope: &str,
    request: UpdateActivePointerRequest,
    now: i64,
) -> Result<ActivePointerResponse, ApiError> {
    persistence
        .update_active_pointer(scope, request.into(), now)
        .map(ActivePointerResponse::from)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Reference entities
// ============================================================================

/// # Errors
///
/// Returns an error if the name is blank.
pub fn create_dispatcher(
    persistence: &mut Persistence,
    request: &NewDispatcher,
    now: i64,
) -> Result<Dispatcher, ApiError> {
    request.validate().map_err(translate_domain_error)?;
    persistence
        .create_dispatcher(request, now)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the dispatcher does not exist.
pub fn get_dispatcher(
    persistence: &mut Persistence,
    dispatcher_id: i64,
) -> Result<Dispatcher, ApiError> {
    persistence
        .get_dispatcher(dispatcher_id)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list_dispatchers(persistence: &mut Persistence) -> Result<ListDispatchersResponse, ApiError> {
    let dispatchers: Vec<Dispatcher> = persistence
        .list_dispatchers()
        .map_err(translate_persistence_error)?;
    Ok(ListDispatchersResponse { dispatchers })
}

/// # Errors
///
/// Returns an error if the name is blank.
pub fn create_rescuer(
    persistence: &mut Persistence,
    request: &NewRescuer,
    now: i64,
) -> Result<Rescuer, ApiError> {
    request.validate().map_err(translate_domain_error)?;
    persistence
        .create_rescuer(request, now)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the rescuer does not exist.
pub fn get_rescuer(persistence: &mut Persistence, rescuer_id: i64) -> Result<Rescuer, ApiError> {
    persistence
        .get_rescuer(rescuer_id)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list_rescuers(persistence: &mut Persistence) -> Result<ListRescuersResponse, ApiError> {
    let rescuers: Vec<Rescuer> = persistence
        .list_rescuers()
        .map_err(translate_persistence_error)?;
    Ok(ListRescuersResponse { rescuers })
}

/// Records a rescuer's last known position.
///
/// # Errors
///
/// Returns an error if the coordinates are out of range or the rescuer
/// does not exist.
pub fn update_rescuer_location(
    persistence: &mut Persistence,
    rescuer_id: i64,
    location: RescuerLocation,
    now: i64,
) -> Result<Rescuer, ApiError> {
    validate_id("rescuer", rescuer_id).map_err(translate_domain_error)?;
    location.validate().map_err(translate_domain_error)?;
    persistence
        .update_rescuer_location(rescuer_id, location, now)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the profile is invalid.
pub fn create_patient(
    persistence: &mut Persistence,
    request: &NewPatient,
    now: i64,
) -> Result<Patient, ApiError> {
    request.validate().map_err(translate_domain_error)?;
    persistence
        .create_patient(request, now)
        .map_err(translate_persistence_error)
}

/// # Errors
///
/// Returns an error if the patient does not exist.
pub fn get_patient(persistence: &mut Persistence, patient_id: i64) -> Result<Patient, ApiError> {
    persistence
        .get_patient(patient_id)
        .map_err(translate_persistence_error)
}

/// Lists patients, most recently created first.
///
/// # Errors
///
/// Returns an error if the limit is invalid.
pub fn list_patients(
    persistence: &mut Persistence,
    limit: Option<i64>,
) -> Result<ListPatientsResponse, ApiError> {
    let limit: i64 = resolve_limit(limit).map_err(translate_domain_error)?;
    let patients: Vec<Patient> = persistence
        .list_patients(limit)
        .map_err(translate_persistence_error)?;
    Ok(ListPatientsResponse { patients })
}

// ============================================================================
// System
// ============================================================================

/// Reports the server clock.
///
/// # Errors
///
/// Returns an error if `now` cannot be represented as a date.
pub fn server_time(now: i64) -> Result<ServerTimeResponse, ApiError> {
    let instant: OffsetDateTime =
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(now) * 1_000_000).map_err(|e| {
            ApiError::Internal {
                message: format!("Clock reading {now} is out of range: {e}"),
            }
        })?;
    let iso: String = instant.format(&Rfc3339).map_err(|e| ApiError::Internal {
        message: format!("Failed to format clock reading: {e}"),
    })?;
    Ok(ServerTimeResponse { now, iso })
}

/// Deletes every record.
///
/// # Errors
///
/// Returns an error if the store cannot be cleared.
pub fn clear_all(persistence: &mut Persistence) -> Result<(), ApiError> {
    persistence
        .clear_all()
        .map_err(translate_persistence_error)?;
    warn!("All dispatch data cleared");
    Ok(())
}
