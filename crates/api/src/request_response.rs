// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests reject unknown fields. Records that already carry serde
//! derives in the domain crate (`Incident`, `Assignment`, `CallRecord`,
//! profiles) are embedded as-is.

use rescue_dispatch_domain::{
    ActivePointer, ActivePointerPatch, Assignment, CallRecord, Dispatcher, Incident,
    IncidentPatch, IncidentStatus, Patient, Rescuer, Speaker, TranscriptChunk,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Incident ingress
// ============================================================================

/// API request to merge extracted facts into the incident for a call session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertIncidentRequest {
    /// The call session the facts were extracted from.
    pub call_session_id: String,
    /// The dispatcher handling the call.
    pub dispatcher_id: i64,
    /// The extracted facts. Omitted fields leave stored values untouched.
    #[serde(default)]
    pub fields: IncidentPatch,
}

/// How an upsert was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertResult {
    /// A new incident was created for the session.
    Created,
    /// The facts were merged into the existing incident.
    Merged,
    /// The incident is closed; nothing was written.
    Unchanged,
}

/// API response for an upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertIncidentResponse {
    pub incident_id: i64,
    pub incident_number: String,
    pub status: IncidentStatus,
    pub result: UpsertResult,
    pub last_updated: i64,
}

/// API request signalling that a call reached the dispatch center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartCallRequest {
    pub call_session_id: String,
    pub dispatcher_id: i64,
    #[serde(default)]
    pub caller_phone: Option<String>,
}

/// API response for a call start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCallResponse {
    pub incident_id: i64,
    pub incident_number: String,
    pub call_id: i64,
    /// False when the session was already known.
    pub created: bool,
}

/// API request signalling that the telephony side hung up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndCallRequest {
    pub call_session_id: String,
}

// ============================================================================
// Incident status
// ============================================================================

/// API request for a dispatcher taking an incoming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptCallRequest {
    pub dispatcher_id: i64,
}

/// API response for any incident status action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentTransitionResponse {
    pub incident: Incident,
    /// False when the action was an idempotent no-op.
    pub changed: bool,
}

/// API response for confirming an emergency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmEmergencyResponse {
    pub incident: Incident,
    /// The open offer for the incident.
    pub assignment: Assignment,
    /// False when an open offer already existed.
    pub assignment_created: bool,
}

// ============================================================================
// Incident reads
// ============================================================================

/// Query parameters for listing incidents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListIncidentsQuery {
    /// Comma-separated statuses. All statuses when omitted.
    #[serde(default)]
    pub status: Option<String>,
    /// Maximum number of incidents, newest first.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Query parameter for lists that only take a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// API response carrying a list of incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListIncidentsResponse {
    pub incidents: Vec<Incident>,
}

/// An incident joined with the records around it.
///
/// Satellite records that cannot be read are `None`; the overview itself
/// only fails when the incident cannot be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentOverview {
    pub incident: Incident,
    pub dispatcher: Option<Dispatcher>,
    pub patient: Option<Patient>,
    pub call: Option<CallRecord>,
    /// The open assignment, or the most recent closed one.
    pub assignment: Option<Assignment>,
}

/// API response for looking up a call session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindBySessionResponse {
    pub found: bool,
    pub incident_id: Option<i64>,
    pub call_id: Option<i64>,
    pub has_call: bool,
}

// ============================================================================
// Transcript
// ============================================================================

/// API request to append one transcript fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendChunkRequest {
    /// Seconds from call start.
    pub offset: f64,
    pub speaker: Speaker,
    pub text: String,
}

/// API response for an appended fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendChunkResponse {
    pub incident_id: i64,
    pub call_id: i64,
    /// Number of chunks in the transcript after the append.
    pub chunk_count: usize,
    pub revision: i64,
}

/// API request to overwrite an incident's transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceTranscriptRequest {
    pub chunks: Vec<TranscriptChunk>,
    /// Keeps the stored phone when omitted.
    #[serde(default)]
    pub caller_phone: Option<String>,
}

// ============================================================================
// Assignments
// ============================================================================

/// API response for an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAssignmentResponse {
    pub assignment: Assignment,
    /// False when an open offer already existed.
    pub created: bool,
}

/// API request for a rescuer claiming an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptAssignmentRequest {
    pub rescuer_id: i64,
}

/// API response for a won claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptAssignmentResponse {
    pub assignment: Assignment,
    pub incident: Incident,
}

/// API response for a rejected offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectAssignmentResponse {
    pub assignment: Assignment,
    /// The replacement offer, when the server re-offers on rejection.
    pub reoffer: Option<Assignment>,
}

/// API response carrying a list of assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAssignmentsResponse {
    pub assignments: Vec<Assignment>,
}

// ============================================================================
// Active pointer
// ============================================================================

/// API request to patch the active pointer.
///
/// `active_incident_id` is tri-state: omitted leaves it untouched, `null`
/// clears it, a number sets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateActivePointerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_dispatcher_id: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub active_incident_id: Option<Option<i64>>,
}

impl From<UpdateActivePointerRequest> for ActivePointerPatch {
    fn from(request: UpdateActivePointerRequest) -> Self {
        Self {
            dispatcher_id: request.active_dispatcher_id,
            incident_id: request.active_incident_id,
        }
    }
}

/// API response for the active pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePointerResponse {
    pub scope: String,
    pub active_dispatcher_id: Option<i64>,
    pub active_incident_id: Option<i64>,
    pub updated_at: i64,
}

impl From<ActivePointer> for ActivePointerResponse {
    fn from(pointer: ActivePointer) -> Self {
        Self {
            scope: pointer.scope,
            active_dispatcher_id: pointer.active_dispatcher_id,
            active_incident_id: pointer.active_incident_id,
            updated_at: pointer.updated_at,
        }
    }
}

// ============================================================================
// Reference entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDispatchersResponse {
    pub dispatchers: Vec<Dispatcher>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRescuersResponse {
    pub rescuers: Vec<Rescuer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPatientsResponse {
    pub patients: Vec<Patient>,
}

// ============================================================================
// System
// ============================================================================

/// API response for the server clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTimeResponse {
    /// Epoch milliseconds.
    pub now: i64,
    /// The same instant as RFC 3339.
    pub iso: String,
}
