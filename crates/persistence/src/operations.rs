// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Engine operations.
//!
//! Each public function here is one atomic unit of work: input is validated
//! first, then the stored records are read, the pure rules in
//! `rescue_dispatch` decide what changes, and the result is written, all
//! inside a single `write_transaction`. A rule violation rolls the
//! transaction back, so a rejected operation commits nothing.
//!
//! The `*_in` helpers run against a connection that is already inside a
//! transaction, which lets one operation compose another (call start runs
//! the upsert, confirmation runs the offer).

use rescue_dispatch::{
    AssignmentEvent, CoreError, IncidentEvent, OfferDecision, RejectPolicy, Transition,
    UpsertOutcome, apply_assignment_event, apply_incident_event, decide_offer, full_text,
    insert_chunk, next_stamp, plan_upsert, sort_chunks, validate_upsert,
};
use rescue_dispatch_domain::{
    ActivePointer, ActivePointerPatch, Assignment, AssignmentStatus, CallRecord, Dispatcher,
    INCOMING_CALL_NOTICE, Incident, IncidentPatch, NewDispatcher, NewPatient, NewRescuer, Patient,
    Rescuer, RescuerLocation, RescuerStatus, Speaker, TranscriptChunk, validate_id,
    validate_session_id,
};
use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::store::RecordStore;

/// Result of an incident status event.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentChange {
    /// The incident as stored after the event.
    pub incident: Incident,
    /// `false` if the event was an idempotent no-op.
    pub changed: bool,
}

/// Result of an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferOutcome {
    /// The open assignment for the incident.
    pub assignment: Assignment,
    /// `false` if an open assignment already existed and was returned.
    pub created: bool,
}

/// Result of confirming an emergency.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOutcome {
    pub incident: Incident,
    pub offer: OfferOutcome,
}

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub assignment: Assignment,
    /// The incident after the `rescuer_assigned` transition.
    pub incident: Incident,
}

/// Result of rejecting or cancelling an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub assignment: Assignment,
    /// The replacement offer, if the reject policy created one.
    pub reoffer: Option<Assignment>,
}

/// Result of a telephony call start.
#[derive(Debug, Clone, PartialEq)]
pub struct CallStart {
    pub incident: Incident,
    pub call: CallRecord,
    /// `true` if this call start created the incident.
    pub created: bool,
}

/// Presence summary for a call session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionLookup {
    pub found: bool,
    pub incident_id: Option<i64>,
    pub call_id: Option<i64>,
    pub has_call: bool,
}

fn require_incident<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
) -> Result<Incident, PersistenceError> {
    conn.load_incident(incident_id)?
        .ok_or_else(|| CoreError::not_found("incident", incident_id).into())
}

fn require_incident_by_session<C: RecordStore>(
    conn: &mut C,
    call_session_id: &str,
) -> Result<Incident, PersistenceError> {
    conn.find_incident_by_session(call_session_id)?
        .ok_or_else(|| {
            CoreError::NotFound {
                resource: "incident",
                id: call_session_id.to_string(),
            }
            .into()
        })
}

fn require_dispatcher<C: RecordStore>(
    conn: &mut C,
    dispatcher_id: i64,
) -> Result<Dispatcher, PersistenceError> {
    conn.load_dispatcher(dispatcher_id)?
        .ok_or_else(|| CoreError::not_found("dispatcher", dispatcher_id).into())
}

fn require_rescuer<C: RecordStore>(
    conn: &mut C,
    rescuer_id: i64,
) -> Result<Rescuer, PersistenceError> {
    conn.load_rescuer(rescuer_id)?
        .ok_or_else(|| CoreError::not_found("rescuer", rescuer_id).into())
}

fn require_patient<C: RecordStore>(
    conn: &mut C,
    patient_id: i64,
) -> Result<Patient, PersistenceError> {
    conn.load_patient(patient_id)?
        .ok_or_else(|| CoreError::not_found("patient", patient_id).into())
}

fn require_assignment<C: RecordStore>(
    conn: &mut C,
    assignment_id: i64,
) -> Result<Assignment, PersistenceError> {
    conn.load_assignment(assignment_id)?
        .ok_or_else(|| CoreError::not_found("assignment", assignment_id).into())
}

// ============================================================================
// Upsert
// ============================================================================

fn upsert_in<C: RecordStore>(
    conn: &mut C,
    call_session_id: &str,
    dispatcher_id: i64,
    patch: &IncidentPatch,
    now: i64,
) -> Result<UpsertOutcome, PersistenceError> {
    let existing: Option<Incident> = conn.find_incident_by_session(call_session_id)?;
    if let Some(incident) = &existing {
        if incident.status.is_terminal() {
            debug!(
                incident_id = incident.incident_id,
                status = %incident.status,
                "Ignoring upsert on terminal incident"
            );
            return Ok(UpsertOutcome::Frozen(incident.clone()));
        }
    }

    require_dispatcher(conn, dispatcher_id)?;
    if let Some(patient_id) = patch.patient_id {
        require_patient(conn, patient_id)?;
    }

    let outcome: UpsertOutcome =
        plan_upsert(existing.as_ref(), call_session_id, dispatcher_id, patch, now)?;

    match outcome {
        UpsertOutcome::Created(incident) => {
            Ok(UpsertOutcome::Created(conn.insert_incident(&incident)?))
        }
        UpsertOutcome::Merged(incident) => {
            let observed: i64 = existing.map_or(incident.last_updated, |e| e.last_updated);
            conn.update_incident(&incident, observed)?;
            debug!(
                incident_id = incident.incident_id,
                call_session_id, "Merged extracted fields"
            );
            Ok(UpsertOutcome::Merged(incident))
        }
        UpsertOutcome::Frozen(incident) => Ok(UpsertOutcome::Frozen(incident)),
    }
}

/// Creates or merges the incident for a call session.
///
/// # Arguments
///
/// * `conn` - The store connection
/// * `call_session_id` - The telephony session key
/// * `dispatcher_id` - The dispatcher recorded on creation
/// * `patch` - Extracted fields; absent fields leave stored values untouched
/// * `now` - Current time in epoch milliseconds
///
/// # Errors
///
/// Returns an error if validation fails, the dispatcher or a supplied
/// patient does not exist, or a concurrent writer changed the incident.
pub fn upsert_incident<C: RecordStore>(
    conn: &mut C,
    call_session_id: &str,
    dispatcher_id: i64,
    patch: &IncidentPatch,
    now: i64,
) -> Result<UpsertOutcome, PersistenceError> {
    validate_upsert(call_session_id, dispatcher_id, patch)?;
    conn.write_transaction(|tx| upsert_in(tx, call_session_id, dispatcher_id, patch, now))
}

/// Registers an incoming call.
///
/// Creates the incident with default fields and a call record seeded with a
/// system notice at offset zero. Repeating a call start for a known session
/// returns the stored records unchanged, creating the call record if the
/// incident had none.
///
/// # Errors
///
/// Returns an error if validation fails or the dispatcher does not exist.
pub fn start_incoming_call<C: RecordStore>(
    conn: &mut C,
    call_session_id: &str,
    dispatcher_id: i64,
    caller_phone: Option<String>,
    now: i64,
) -> Result<CallStart, PersistenceError> {
    let patch: IncidentPatch = IncidentPatch::default();
    validate_upsert(call_session_id, dispatcher_id, &patch)?;

    conn.write_transaction(|tx| {
        let (incident, created): (Incident, bool) =
            match tx.find_incident_by_session(call_session_id)? {
                Some(existing) => (existing, false),
                None => {
                    let outcome: UpsertOutcome =
                        upsert_in(tx, call_session_id, dispatcher_id, &patch, now)?;
                    (outcome.incident().clone(), true)
                }
            };

        let call: CallRecord = match tx.load_call(incident.incident_id)? {
            Some(call) => call,
            None => {
                let chunks: Vec<TranscriptChunk> = vec![TranscriptChunk::new(
                    0.0,
                    Speaker::System,
                    INCOMING_CALL_NOTICE,
                )];
                tx.insert_call(&CallRecord {
                    call_id: 0,
                    incident_id: incident.incident_id,
                    caller_phone,
                    transcription: full_text(&chunks),
                    chunks,
                    revision: 1,
                    created_at: now,
                    updated_at: now,
                })?
            }
        };

        info!(
            incident_id = incident.incident_id,
            call_id = call.call_id,
            created,
            "Incoming call registered"
        );
        Ok(CallStart {
            incident,
            call,
            created,
        })
    })
}

// ============================================================================
// Incident status machine
// ============================================================================

fn apply_event_in<C: RecordStore>(
    conn: &mut C,
    incident: Incident,
    event: IncidentEvent,
    now: i64,
) -> Result<IncidentChange, PersistenceError> {
    match apply_incident_event(&incident, event, now)? {
        Transition::Changed(next) => {
            conn.update_incident(&next, incident.last_updated)?;
            info!(
                incident_id = next.incident_id,
                event = event.name(),
                from = %incident.status,
                to = %next.status,
                "Incident transition"
            );
            Ok(IncidentChange {
                incident: next,
                changed: true,
            })
        }
        Transition::Unchanged => Ok(IncidentChange {
            incident,
            changed: false,
        }),
    }
}

/// Applies a status event to an incident.
///
/// # Errors
///
/// Returns an error if the incident (or, for `AcceptCall`, the dispatcher)
/// does not exist, or the event is not legal from the current status.
pub fn apply_event<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
    event: IncidentEvent,
    now: i64,
) -> Result<IncidentChange, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;
    if let IncidentEvent::AcceptCall { dispatcher_id } = event {
        validate_id("dispatcher", dispatcher_id).map_err(CoreError::from)?;
    }

    conn.write_transaction(|tx| {
        if let IncidentEvent::AcceptCall { dispatcher_id } = event {
            require_dispatcher(tx, dispatcher_id)?;
        }
        let incident: Incident = require_incident(tx, incident_id)?;
        apply_event_in(tx, incident, event, now)
    })
}

/// Completes the incident of a telephony session.
///
/// # Errors
///
/// Returns an error if the session id is malformed or no incident exists
/// for it.
pub fn end_call_by_session<C: RecordStore>(
    conn: &mut C,
    call_session_id: &str,
    now: i64,
) -> Result<IncidentChange, PersistenceError> {
    validate_session_id(call_session_id).map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        let incident: Incident = require_incident_by_session(tx, call_session_id)?;
        apply_event_in(tx, incident, IncidentEvent::EndCall, now)
    })
}

/// Confirms a real emergency and makes sure an offer is out for it.
///
/// # Errors
///
/// Returns an error if the incident does not exist or is not `confirmed`.
pub fn confirm_emergency<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
    now: i64,
) -> Result<ConfirmOutcome, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        let incident: Incident = require_incident(tx, incident_id)?;
        let IncidentChange { mut incident, .. } =
            apply_event_in(tx, incident, IncidentEvent::ConfirmEmergency, now)?;
        let offer: OfferOutcome = offer_in(tx, &mut incident, now)?;
        Ok(ConfirmOutcome { incident, offer })
    })
}

// ============================================================================
// Assignment arbitration
// ============================================================================

fn offer_in<C: RecordStore>(
    conn: &mut C,
    incident: &mut Incident,
    now: i64,
) -> Result<OfferOutcome, PersistenceError> {
    let existing: Vec<Assignment> = conn.list_assignments_for_incident(incident.incident_id)?;

    match decide_offer(incident, &existing, now)? {
        OfferDecision::Existing(assignment) => Ok(OfferOutcome {
            assignment,
            created: false,
        }),
        OfferDecision::Create(offer) => {
            // Claim the incident row first so a concurrent offer that read
            // the same assignment list fails instead of inserting a second.
            let stamp: i64 = next_stamp(incident.last_updated, now);
            conn.touch_incident(incident.incident_id, incident.last_updated, stamp)?;
            incident.last_updated = stamp;

            let assignment: Assignment = conn.insert_assignment(&offer)?;
            Ok(OfferOutcome {
                assignment,
                created: true,
            })
        }
    }
}

/// Broadcasts an offer for an incident, or returns the one already open.
///
/// # Errors
///
/// Returns an error if the incident does not exist or is not active.
pub fn offer_assignment<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
    now: i64,
) -> Result<OfferOutcome, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        let mut incident: Incident = require_incident(tx, incident_id)?;
        offer_in(tx, &mut incident, now)
    })
}

/// Claims a pending assignment for a rescuer.
///
/// Exactly one of any number of concurrent claims on the same assignment
/// succeeds; the others fail with `AlreadyClaimed`. The winning claim moves
/// the incident to `rescuer_assigned` and marks the rescuer on call in the
/// same transaction.
///
/// # Errors
///
/// Returns an error if the assignment or rescuer does not exist, the
/// assignment is already claimed, or the incident is closed.
pub fn accept_assignment<C: RecordStore>(
    conn: &mut C,
    assignment_id: i64,
    rescuer_id: i64,
    now: i64,
) -> Result<ClaimOutcome, PersistenceError> {
    validate_id("assignment", assignment_id).map_err(CoreError::from)?;
    validate_id("rescuer", rescuer_id).map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        let current: Assignment = require_assignment(tx, assignment_id)?;
        require_rescuer(tx, rescuer_id)?;

        let claimed: Assignment =
            apply_assignment_event(&current, AssignmentEvent::Accept { rescuer_id }, now)?;
        if !tx.update_assignment(&claimed, AssignmentStatus::Pending)? {
            info!(assignment_id, rescuer_id, "Lost claim race");
            return Err(CoreError::AlreadyClaimed { assignment_id }.into());
        }

        let incident: Incident = require_incident(tx, claimed.incident_id)?;
        let IncidentChange { incident, .. } =
            apply_event_in(tx, incident, IncidentEvent::AssignmentAccepted, now)?;
        tx.set_rescuer_status(rescuer_id, RescuerStatus::OnCall)?;

        info!(
            assignment_id,
            rescuer_id,
            incident_id = incident.incident_id,
            "Assignment claimed"
        );
        Ok(ClaimOutcome {
            assignment: claimed,
            incident,
        })
    })
}

fn resolve_pending<C: RecordStore>(
    conn: &mut C,
    assignment_id: i64,
    event: AssignmentEvent,
    policy: RejectPolicy,
    now: i64,
) -> Result<ResolveOutcome, PersistenceError> {
    validate_id("assignment", assignment_id).map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        let current: Assignment = require_assignment(tx, assignment_id)?;
        let next: Assignment = apply_assignment_event(&current, event, now)?;
        if !tx.update_assignment(&next, current.status)? {
            return Err(PersistenceError::WriteConflict(format!(
                "assignment {assignment_id} changed since it was read"
            )));
        }
        info!(assignment_id, event = event.name(), "Offer withdrawn");

        let mut reoffer: Option<Assignment> = None;
        if event == AssignmentEvent::Reject {
            let mut incident: Incident = require_incident(tx, next.incident_id)?;
            if policy.reoffers_for(&incident) {
                let outcome: OfferOutcome = offer_in(tx, &mut incident, now)?;
                reoffer = Some(outcome.assignment);
            }
        }

        Ok(ResolveOutcome {
            assignment: next,
            reoffer,
        })
    })
}

/// Declines a pending offer. Under `RejectPolicy::Reoffer` a fresh offer
/// for the same incident is created in the same transaction.
///
/// # Errors
///
/// Returns an error if the assignment does not exist or is not pending.
pub fn reject_assignment<C: RecordStore>(
    conn: &mut C,
    assignment_id: i64,
    policy: RejectPolicy,
    now: i64,
) -> Result<ResolveOutcome, PersistenceError> {
    resolve_pending(conn, assignment_id, AssignmentEvent::Reject, policy, now)
}

/// Withdraws a pending offer.
///
/// # Errors
///
/// Returns an error if the assignment does not exist or is not pending.
pub fn cancel_assignment<C: RecordStore>(
    conn: &mut C,
    assignment_id: i64,
    now: i64,
) -> Result<Assignment, PersistenceError> {
    resolve_pending(
        conn,
        assignment_id,
        AssignmentEvent::Cancel,
        RejectPolicy::AwaitDispatcher,
        now,
    )
    .map(|outcome| outcome.assignment)
}

/// Finishes an accepted assignment and releases its rescuer.
///
/// # Errors
///
/// Returns an error if the assignment does not exist or is not accepted.
pub fn complete_assignment<C: RecordStore>(
    conn: &mut C,
    assignment_id: i64,
    now: i64,
) -> Result<Assignment, PersistenceError> {
    validate_id("assignment", assignment_id).map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        let current: Assignment = require_assignment(tx, assignment_id)?;
        let next: Assignment = apply_assignment_event(&current, AssignmentEvent::Complete, now)?;
        if !tx.update_assignment(&next, AssignmentStatus::Accepted)? {
            return Err(PersistenceError::WriteConflict(format!(
                "assignment {assignment_id} changed since it was read"
            )));
        }
        if let Some(rescuer_id) = next.rescuer_id {
            tx.set_rescuer_status(rescuer_id, RescuerStatus::Available)?;
        }

        info!(assignment_id, "Assignment completed");
        Ok(next)
    })
}

// ============================================================================
// Transcript
// ============================================================================

/// Inserts a transcript chunk in offset order, creating the call record if
/// the incident has none yet.
///
/// # Returns
///
/// The call record as stored; its chunk count is the new total.
///
/// # Errors
///
/// Returns an error if the chunk offset is invalid or the incident does not
/// exist.
pub fn append_chunk<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
    chunk: TranscriptChunk,
    now: i64,
) -> Result<CallRecord, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;
    chunk.validate().map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        require_incident(tx, incident_id)?;

        match tx.load_call(incident_id)? {
            Some(mut call) => {
                let observed: i64 = call.revision;
                insert_chunk(&mut call.chunks, chunk)?;
                call.transcription = full_text(&call.chunks);
                call.revision = observed + 1;
                call.updated_at = now;
                tx.update_call(&call, observed)?;
                debug!(
                    incident_id,
                    chunks = call.chunks.len(),
                    "Appended transcript chunk"
                );
                Ok(call)
            }
            None => {
                let mut chunks: Vec<TranscriptChunk> = Vec::new();
                insert_chunk(&mut chunks, chunk)?;
                tx.insert_call(&CallRecord {
                    call_id: 0,
                    incident_id,
                    caller_phone: None,
                    transcription: full_text(&chunks),
                    chunks,
                    revision: 1,
                    created_at: now,
                    updated_at: now,
                })
            }
        }
    })
}

/// Creates or overwrites the call record of an incident.
///
/// Chunks are sorted by offset and the full text is derived from them.
/// An omitted caller phone keeps the stored one.
///
/// # Errors
///
/// Returns an error if a chunk offset is invalid or the incident does not
/// exist.
pub fn replace_transcript<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
    chunks: Vec<TranscriptChunk>,
    caller_phone: Option<String>,
    now: i64,
) -> Result<CallRecord, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;
    let chunks: Vec<TranscriptChunk> = sort_chunks(chunks)?;
    let transcription: String = full_text(&chunks);

    conn.write_transaction(|tx| {
        require_incident(tx, incident_id)?;

        match tx.load_call(incident_id)? {
            Some(mut call) => {
                let observed: i64 = call.revision;
                if caller_phone.is_some() {
                    call.caller_phone = caller_phone;
                }
                call.chunks = chunks;
                call.transcription = transcription;
                call.revision = observed + 1;
                call.updated_at = now;
                tx.update_call(&call, observed)?;
                Ok(call)
            }
            None => tx.insert_call(&CallRecord {
                call_id: 0,
                incident_id,
                caller_phone,
                chunks,
                transcription,
                revision: 1,
                created_at: now,
                updated_at: now,
            }),
        }
    })
}

// ============================================================================
// Active pointer
// ============================================================================

/// Reads the pointer for `scope`, reporting an empty one before the first
/// write.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn active_pointer<C: RecordStore>(
    conn: &mut C,
    scope: &str,
) -> Result<ActivePointer, PersistenceError> {
    Ok(conn
        .load_pointer(scope)?
        .unwrap_or_else(|| ActivePointer::empty(scope)))
}

/// Patches the pointer for `scope`.
///
/// # Errors
///
/// Returns an error if a referenced dispatcher or incident does not exist.
pub fn update_active_pointer<C: RecordStore>(
    conn: &mut C,
    scope: &str,
    patch: ActivePointerPatch,
    now: i64,
) -> Result<ActivePointer, PersistenceError> {
    if let Some(dispatcher_id) = patch.dispatcher_id {
        validate_id("dispatcher", dispatcher_id).map_err(CoreError::from)?;
    }
    if let Some(Some(incident_id)) = patch.incident_id {
        validate_id("incident", incident_id).map_err(CoreError::from)?;
    }

    conn.write_transaction(|tx| {
        if let Some(dispatcher_id) = patch.dispatcher_id {
            require_dispatcher(tx, dispatcher_id)?;
        }
        if let Some(Some(incident_id)) = patch.incident_id {
            require_incident(tx, incident_id)?;
        }

        let mut pointer: ActivePointer = active_pointer(tx, scope)?;
        patch.apply(&mut pointer);
        pointer.updated_at = next_stamp(pointer.updated_at, now);
        tx.save_pointer(&pointer)?;

        debug!(
            scope,
            dispatcher_id = ?pointer.active_dispatcher_id,
            incident_id = ?pointer.active_incident_id,
            "Active pointer updated"
        );
        Ok(pointer)
    })
}

// ============================================================================
// Reads
// ============================================================================

/// # Errors
///
/// Returns an error if the incident does not exist.
pub fn get_incident<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
) -> Result<Incident, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;
    require_incident(conn, incident_id)
}

/// # Errors
///
/// Returns an error if the session id is malformed or unknown.
pub fn get_incident_by_session<C: RecordStore>(
    conn: &mut C,
    call_session_id: &str,
) -> Result<Incident, PersistenceError> {
    validate_session_id(call_session_id).map_err(CoreError::from)?;
    require_incident_by_session(conn, call_session_id)
}

/// Reports whether a session has an incident and a call record.
///
/// # Errors
///
/// Returns an error if the session id is malformed or a query fails.
pub fn find_by_session<C: RecordStore>(
    conn: &mut C,
    call_session_id: &str,
) -> Result<SessionLookup, PersistenceError> {
    validate_session_id(call_session_id).map_err(CoreError::from)?;

    let Some(incident) = conn.find_incident_by_session(call_session_id)? else {
        return Ok(SessionLookup::default());
    };
    let call_id: Option<i64> = conn
        .load_call(incident.incident_id)?
        .map(|call| call.call_id);

    Ok(SessionLookup {
        found: true,
        incident_id: Some(incident.incident_id),
        call_id,
        has_call: call_id.is_some(),
    })
}

/// # Errors
///
/// Returns an error if the incident does not exist or has no call record.
pub fn get_call<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
) -> Result<CallRecord, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;
    require_incident(conn, incident_id)?;
    conn.load_call(incident_id)?
        .ok_or_else(|| CoreError::not_found("call", incident_id).into())
}

/// # Errors
///
/// Returns an error if the incident does not exist.
pub fn assignments_for_incident<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
) -> Result<Vec<Assignment>, PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;
    require_incident(conn, incident_id)?;
    conn.list_assignments_for_incident(incident_id)
}

/// # Errors
///
/// Returns an error if the rescuer does not exist.
pub fn assignments_for_rescuer<C: RecordStore>(
    conn: &mut C,
    rescuer_id: i64,
) -> Result<Vec<Assignment>, PersistenceError> {
    validate_id("rescuer", rescuer_id).map_err(CoreError::from)?;
    require_rescuer(conn, rescuer_id)?;
    conn.list_assignments_for_rescuer(rescuer_id)
}

// ============================================================================
// Reference entities
// ============================================================================

/// # Errors
///
/// Returns an error if the name is blank or the insert fails.
pub fn create_dispatcher<C: RecordStore>(
    conn: &mut C,
    dispatcher: &NewDispatcher,
    now: i64,
) -> Result<Dispatcher, PersistenceError> {
    dispatcher.validate().map_err(CoreError::from)?;
    conn.write_transaction(|tx| tx.insert_dispatcher(dispatcher, now))
}

/// # Errors
///
/// Returns an error if the dispatcher does not exist.
pub fn get_dispatcher<C: RecordStore>(
    conn: &mut C,
    dispatcher_id: i64,
) -> Result<Dispatcher, PersistenceError> {
    validate_id("dispatcher", dispatcher_id).map_err(CoreError::from)?;
    require_dispatcher(conn, dispatcher_id)
}

/// # Errors
///
/// Returns an error if the name is blank or the insert fails.
pub fn create_rescuer<C: RecordStore>(
    conn: &mut C,
    rescuer: &NewRescuer,
    now: i64,
) -> Result<Rescuer, PersistenceError> {
    rescuer.validate().map_err(CoreError::from)?;
    conn.write_transaction(|tx| tx.insert_rescuer(rescuer, now))
}

/// # Errors
///
/// Returns an error if the rescuer does not exist.
pub fn get_rescuer<C: RecordStore>(
    conn: &mut C,
    rescuer_id: i64,
) -> Result<Rescuer, PersistenceError> {
    validate_id("rescuer", rescuer_id).map_err(CoreError::from)?;
    require_rescuer(conn, rescuer_id)
}

/// Records a rescuer's position.
///
/// # Errors
///
/// Returns an error if the coordinates are out of range or the rescuer does
/// not exist.
pub fn update_rescuer_location<C: RecordStore>(
    conn: &mut C,
    rescuer_id: i64,
    location: RescuerLocation,
    now: i64,
) -> Result<Rescuer, PersistenceError> {
    validate_id("rescuer", rescuer_id).map_err(CoreError::from)?;
    location.validate().map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        if !tx.update_rescuer_location(rescuer_id, location, now)? {
            return Err(CoreError::not_found("rescuer", rescuer_id).into());
        }
        require_rescuer(tx, rescuer_id)
    })
}

/// # Errors
///
/// Returns an error if validation fails or the insert fails.
pub fn create_patient<C: RecordStore>(
    conn: &mut C,
    patient: &NewPatient,
    now: i64,
) -> Result<Patient, PersistenceError> {
    patient.validate().map_err(CoreError::from)?;
    conn.write_transaction(|tx| tx.insert_patient(patient, now))
}

/// # Errors
///
/// Returns an error if the patient does not exist.
pub fn get_patient<C: RecordStore>(
    conn: &mut C,
    patient_id: i64,
) -> Result<Patient, PersistenceError> {
    validate_id("patient", patient_id).map_err(CoreError::from)?;
    require_patient(conn, patient_id)
}

// ============================================================================
// Administrative
// ============================================================================

/// Deletes an incident with its call record and assignments.
///
/// # Errors
///
/// Returns an error if the incident does not exist.
pub fn delete_incident<C: RecordStore>(
    conn: &mut C,
    incident_id: i64,
) -> Result<(), PersistenceError> {
    validate_id("incident", incident_id).map_err(CoreError::from)?;

    conn.write_transaction(|tx| {
        if tx.delete_incident(incident_id)? {
            Ok(())
        } else {
            Err(CoreError::not_found("incident", incident_id).into())
        }
    })
}

/// Deletes every record.
///
/// # Errors
///
/// Returns an error if a delete fails.
pub fn clear_all<C: RecordStore>(conn: &mut C) -> Result<(), PersistenceError> {
    conn.write_transaction(RecordStore::clear_all)
}
