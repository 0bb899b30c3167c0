// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the rescue dispatch engine.
//!
//! Handlers translate request DTOs into persistence operations and
//! persistence results into response DTOs. Errors cross this boundary only
//! as [`ApiError`]; the server maps those to HTTP status codes.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use handlers::{
    accept_assignment, accept_call, append_chunk, cancel_assignment, cancel_incident, clear_all,
    complete_assignment, confirm_emergency, create_dispatcher, create_patient, create_rescuer,
    current_time_millis, delete_incident, end_call, end_incident_call, find_by_session,
    get_active_pointer, get_dispatcher, get_incident, get_incident_by_session,
    get_incident_overview, get_patient, get_rescuer, get_transcript, list_active,
    list_dispatchers, list_incident_assignments, list_incidents, list_incoming, list_patients,
    list_pending_offers, list_rescuer_assignments, list_rescuers, offer_assignment,
    reject_assignment, replace_transcript, server_time, start_call, update_active_pointer,
    update_rescuer_location, upsert_incident,
};
pub use request_response::{
    AcceptAssignmentRequest, AcceptAssignmentResponse, AcceptCallRequest, ActivePointerResponse,
    AppendChunkRequest, AppendChunkResponse, ConfirmEmergencyResponse, EndCallRequest,
    FindBySessionResponse, IncidentOverview, IncidentTransitionResponse, LimitQuery,
    ListAssignmentsResponse, ListDispatchersResponse, ListIncidentsQuery, ListIncidentsResponse,
    ListPatientsResponse, ListRescuersResponse, OfferAssignmentResponse, RejectAssignmentResponse,
    ReplaceTranscriptRequest, ServerTimeResponse, StartCallRequest, StartCallResponse,
    UpdateActivePointerRequest, UpsertIncidentRequest, UpsertIncidentResponse, UpsertResult,
};
