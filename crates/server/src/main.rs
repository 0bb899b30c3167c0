// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod live;

use axum::{
    Json, Router,
    extract::{FromRef, Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use clap::Parser;
use rescue_dispatch::RejectPolicy;
use rescue_dispatch_api::{
    AcceptAssignmentRequest, AcceptAssignmentResponse, AcceptCallRequest, ActivePointerResponse,
    ApiError, AppendChunkRequest, AppendChunkResponse, ConfirmEmergencyResponse, EndCallRequest,
    FindBySessionResponse, IncidentOverview, IncidentTransitionResponse, LimitQuery,
    ListAssignmentsResponse, ListDispatchersResponse, ListIncidentsQuery, ListIncidentsResponse,
    ListPatientsResponse, ListRescuersResponse, OfferAssignmentResponse, RejectAssignmentResponse,
    ReplaceTranscriptRequest, ServerTimeResponse, StartCallRequest, StartCallResponse,
    UpdateActivePointerRequest, UpsertIncidentRequest, UpsertIncidentResponse, UpsertResult,
    current_time_millis,
};
use rescue_dispatch_domain::{
    Assignment, CallRecord, DEFAULT_POINTER_SCOPE, Dispatcher, Incident, NewDispatcher,
    NewPatient, NewRescuer, Patient, Rescuer, RescuerLocation,
};
use rescue_dispatch_persistence::{Persistence, PersistenceError};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::live::{LiveEvent, LiveEventBroadcaster, live_events_handler};

/// Rescue Dispatch Server - incident lifecycle and rescue assignment service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// `MySQL`/`MariaDB` connection URL. Takes precedence over `--database`.
    #[cfg(feature = "mysql")]
    #[arg(long, conflicts_with = "database")]
    mysql_url: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Active-pointer scope this server reads and writes
    #[arg(long, default_value = DEFAULT_POINTER_SCOPE)]
    pointer_scope: String,

    /// What happens after a rescuer rejects an offer (`await-dispatcher` or `reoffer`)
    #[arg(long, default_value = "await-dispatcher", value_parser = parse_reject_policy)]
    reject_policy: RejectPolicy,
}

fn parse_reject_policy(value: &str) -> Result<RejectPolicy, String> {
    value.parse::<RejectPolicy>().map_err(|e| e.to_string())
}

/// Application state shared across handlers.
///
/// Configuration is fixed at startup; the persistence layer sits behind a
/// Mutex so each request runs its transaction on the single connection.
#[derive(Clone)]
struct AppState {
    persistence: Arc<Mutex<Persistence>>,
    /// The active-pointer scope served by this process.
    pointer_scope: Arc<str>,
    reject_policy: RejectPolicy,
    live: Arc<LiveEventBroadcaster>,
}

impl FromRef<AppState> for Arc<LiveEventBroadcaster> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.live)
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Machine-readable error kind.
    kind: String,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    kind: String,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            kind: self.kind,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let (status, kind): (StatusCode, String) = match &err {
            ApiError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, String::from("invalid_input")),
            ApiError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, String::from("not_found")),
            ApiError::DomainRuleViolation { rule, .. } => (StatusCode::CONFLICT, rule.clone()),
            ApiError::Conflict { reason, .. } => (StatusCode::CONFLICT, reason.clone()),
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, String::from("internal"))
            }
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

fn incident_updated(incident: &Incident) -> LiveEvent {
    LiveEvent::IncidentUpdated {
        incident_id: incident.incident_id,
        status: incident.status,
        last_updated: incident.last_updated,
    }
}

fn assignment_offered(assignment: &Assignment) -> LiveEvent {
    LiveEvent::AssignmentOffered {
        assignment_id: assignment.assignment_id,
        incident_id: assignment.incident_id,
    }
}

fn assignment_resolved(assignment: &Assignment) -> LiveEvent {
    LiveEvent::AssignmentResolved {
        assignment_id: assignment.assignment_id,
        incident_id: assignment.incident_id,
        status: assignment.status,
    }
}

fn transcript_updated(call: &CallRecord) -> LiveEvent {
    LiveEvent::TranscriptUpdated {
        incident_id: call.incident_id,
        chunk_count: call.chunks.len(),
        revision: call.revision,
    }
}

/// Broadcasts an incident change unless the action was a no-op.
fn broadcast_transition(app_state: &AppState, response: &IncidentTransitionResponse) {
    if response.changed {
        app_state.live.broadcast(incident_updated(&response.incident));
    }
}

// ============================================================================
// Incident ingress
// ============================================================================

/// Handler for POST `/incidents/upsert`.
async fn handle_upsert_incident(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<UpsertIncidentRequest>,
) -> Result<Json<UpsertIncidentResponse>, HttpError> {
    debug!(call_session_id = %req.call_session_id, "Handling upsert_incident request");

    let mut persistence = app_state.persistence.lock().await;
    let response: UpsertIncidentResponse =
        rescue_dispatch_api::upsert_incident(&mut persistence, &req, current_time_millis())?;
    drop(persistence);

    if response.result != UpsertResult::Unchanged {
        app_state.live.broadcast(LiveEvent::IncidentUpdated {
            incident_id: response.incident_id,
            status: response.status,
            last_updated: response.last_updated,
        });
    }
    Ok(Json(response))
}

/// Handler for POST `/calls/start`.
async fn handle_start_call(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<StartCallRequest>,
) -> Result<Json<StartCallResponse>, HttpError> {
    info!(call_session_id = %req.call_session_id, "Handling start_call request");

    let mut persistence = app_state.persistence.lock().await;
    let (response, incident): (StartCallResponse, Incident) =
        rescue_dispatch_api::start_call(&mut persistence, req, current_time_millis())?;
    drop(persistence);

    if response.created {
        app_state.live.broadcast(incident_updated(&incident));
    }
    Ok(Json(response))
}

/// Handler for POST `/calls/end`.
async fn handle_end_call(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<EndCallRequest>,
) -> Result<Json<IncidentTransitionResponse>, HttpError> {
    info!(call_session_id = %req.call_session_id, "Handling end_call request");

    let mut persistence = app_state.persistence.lock().await;
    let response: IncidentTransitionResponse =
        rescue_dispatch_api::end_call(&mut persistence, &req, current_time_millis())?;
    drop(persistence);

    broadcast_transition(&app_state, &response);
    Ok(Json(response))
}

// ============================================================================
// Incident reads
// ============================================================================

/// Handler for GET `/incidents`.
async fn handle_list_incidents(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ListIncidentsQuery>,
) -> Result<Json<ListIncidentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_incidents(
        &mut persistence,
        &query,
    )?))
}

/// Handler for GET `/incidents/incoming`.
async fn handle_list_incoming(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ListIncidentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_incoming(
        &mut persistence,
        query.limit,
    )?))
}

/// Handler for GET `/incidents/active`.
async fn handle_list_active(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ListIncidentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_active(
        &mut persistence,
        query.limit,
    )?))
}

/// Handler for GET `/incidents/{id}`.
async fn handle_get_incident(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<Incident>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_incident(
        &mut persistence,
        incident_id,
    )?))
}

/// Handler for GET `/incidents/{id}/overview`.
async fn handle_get_incident_overview(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<IncidentOverview>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_incident_overview(
        &mut persistence,
        incident_id,
    )?))
}

/// Handler for GET `/incidents/by_session/{session_id}`.
async fn handle_get_incident_by_session(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Incident>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_incident_by_session(
        &mut persistence,
        &session_id,
    )?))
}

/// Handler for GET `/incidents/find_by_session/{session_id}`.
async fn handle_find_by_session(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<FindBySessionResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::find_by_session(
        &mut persistence,
        &session_id,
    )?))
}

/// Handler for DELETE `/incidents/{id}`.
async fn handle_delete_incident(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    info!(incident_id, "Handling delete_incident request");

    let mut persistence = app_state.persistence.lock().await;
    rescue_dispatch_api::delete_incident(&mut persistence, incident_id)?;
    drop(persistence);

    app_state
        .live
        .broadcast(LiveEvent::IncidentDeleted { incident_id });
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Incident status
// ============================================================================

/// Handler for POST `/incidents/{id}/accept`.
async fn handle_accept_call(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
    Json(req): Json<AcceptCallRequest>,
) -> Result<Json<IncidentTransitionResponse>, HttpError> {
    info!(incident_id, dispatcher_id = req.dispatcher_id, "Handling accept_call request");

    let mut persistence = app_state.persistence.lock().await;
    let response: IncidentTransitionResponse = rescue_dispatch_api::accept_call(
        &mut persistence,
        incident_id,
        req,
        current_time_millis(),
    )?;
    drop(persistence);

    broadcast_transition(&app_state, &response);
    Ok(Json(response))
}

/// Handler for POST `/incidents/{id}/confirm`.
async fn handle_confirm_emergency(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<ConfirmEmergencyResponse>, HttpError> {
    info!(incident_id, "Handling confirm_emergency request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ConfirmEmergencyResponse =
        rescue_dispatch_api::confirm_emergency(&mut persistence, incident_id, current_time_millis())?;
    drop(persistence);

    if response.assignment_created {
        app_state.live.broadcast(incident_updated(&response.incident));
        app_state
            .live
            .broadcast(assignment_offered(&response.assignment));
    }
    Ok(Json(response))
}

/// Handler for POST `/incidents/{id}/end`.
async fn handle_end_incident_call(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<IncidentTransitionResponse>, HttpError> {
    info!(incident_id, "Handling end_incident_call request");

    let mut persistence = app_state.persistence.lock().await;
    let response: IncidentTransitionResponse =
        rescue_dispatch_api::end_incident_call(&mut persistence, incident_id, current_time_millis())?;
    drop(persistence);

    broadcast_transition(&app_state, &response);
    Ok(Json(response))
}

/// Handler for POST `/incidents/{id}/cancel`.
async fn handle_cancel_incident(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<IncidentTransitionResponse>, HttpError> {
    info!(incident_id, "Handling cancel_incident request");

    let mut persistence = app_state.persistence.lock().await;
    let response: IncidentTransitionResponse =
        rescue_dispatch_api::cancel_incident(&mut persistence, incident_id, current_time_millis())?;
    drop(persistence);

    broadcast_transition(&app_state, &response);
    Ok(Json(response))
}

// ============================================================================
// Transcript
// ============================================================================

/// Handler for GET `/incidents/{id}/transcript`.
async fn handle_get_transcript(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<CallRecord>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_transcript(
        &mut persistence,
        incident_id,
    )?))
}

/// Handler for POST `/incidents/{id}/transcript`.
async fn handle_append_chunk(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
    Json(req): Json<AppendChunkRequest>,
) -> Result<Json<AppendChunkResponse>, HttpError> {
    debug!(incident_id, offset = req.offset, "Handling append_chunk request");

    let mut persistence = app_state.persistence.lock().await;
    let (response, call): (AppendChunkResponse, CallRecord) = rescue_dispatch_api::append_chunk(
        &mut persistence,
        incident_id,
        req,
        current_time_millis(),
    )?;
    drop(persistence);

    app_state.live.broadcast(transcript_updated(&call));
    Ok(Json(response))
}

/// Handler for PUT `/incidents/{id}/transcript`.
async fn handle_replace_transcript(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
    Json(req): Json<ReplaceTranscriptRequest>,
) -> Result<Json<CallRecord>, HttpError> {
    info!(incident_id, chunks = req.chunks.len(), "Handling replace_transcript request");

    let mut persistence = app_state.persistence.lock().await;
    let call: CallRecord = rescue_dispatch_api::replace_transcript(
        &mut persistence,
        incident_id,
        req,
        current_time_millis(),
    )?;
    drop(persistence);

    app_state.live.broadcast(transcript_updated(&call));
    Ok(Json(call))
}

// ============================================================================
// Assignments
// ============================================================================

/// Handler for POST `/incidents/{id}/assignments`.
async fn handle_offer_assignment(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<OfferAssignmentResponse>, HttpError> {
    info!(incident_id, "Handling offer_assignment request");

    let mut persistence = app_state.persistence.lock().await;
    let response: OfferAssignmentResponse =
        rescue_dispatch_api::offer_assignment(&mut persistence, incident_id, current_time_millis())?;
    drop(persistence);

    if response.created {
        app_state
            .live
            .broadcast(assignment_offered(&response.assignment));
    }
    Ok(Json(response))
}

/// Handler for GET `/incidents/{id}/assignments`.
async fn handle_list_incident_assignments(
    AxumState(app_state): AxumState<AppState>,
    Path(incident_id): Path<i64>,
) -> Result<Json<ListAssignmentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_incident_assignments(
        &mut persistence,
        incident_id,
    )?))
}

/// Handler for GET `/assignments/pending`.
async fn handle_list_pending_offers(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListAssignmentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_pending_offers(
        &mut persistence,
    )?))
}

/// Handler for POST `/assignments/{id}/accept`.
async fn handle_accept_assignment(
    AxumState(app_state): AxumState<AppState>,
    Path(assignment_id): Path<i64>,
    Json(req): Json<AcceptAssignmentRequest>,
) -> Result<Json<AcceptAssignmentResponse>, HttpError> {
    info!(assignment_id, rescuer_id = req.rescuer_id, "Handling accept_assignment request");

    let mut persistence = app_state.persistence.lock().await;
    let response: AcceptAssignmentResponse = rescue_dispatch_api::accept_assignment(
        &mut persistence,
        assignment_id,
        req,
        current_time_millis(),
    )?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::AssignmentClaimed {
        assignment_id,
        incident_id: response.incident.incident_id,
        rescuer_id: req.rescuer_id,
    });
    app_state.live.broadcast(incident_updated(&response.incident));
    Ok(Json(response))
}

/// Handler for POST `/assignments/{id}/reject`.
async fn handle_reject_assignment(
    AxumState(app_state): AxumState<AppState>,
    Path(assignment_id): Path<i64>,
) -> Result<Json<RejectAssignmentResponse>, HttpError> {
    info!(assignment_id, "Handling reject_assignment request");

    let mut persistence = app_state.persistence.lock().await;
    let response: RejectAssignmentResponse = rescue_dispatch_api::reject_assignment(
        &mut persistence,
        assignment_id,
        app_state.reject_policy,
        current_time_millis(),
    )?;
    drop(persistence);

    app_state
        .live
        .broadcast(assignment_resolved(&response.assignment));
    if let Some(reoffer) = &response.reoffer {
        app_state.live.broadcast(assignment_offered(reoffer));
    }
    Ok(Json(response))
}

/// Handler for POST `/assignments/{id}/cancel`.
async fn handle_cancel_assignment(
    AxumState(app_state): AxumState<AppState>,
    Path(assignment_id): Path<i64>,
) -> Result<Json<Assignment>, HttpError> {
    info!(assignment_id, "Handling cancel_assignment request");

    let mut persistence = app_state.persistence.lock().await;
    let assignment: Assignment =
        rescue_dispatch_api::cancel_assignment(&mut persistence, assignment_id, current_time_millis())?;
    drop(persistence);

    app_state.live.broadcast(assignment_resolved(&assignment));
    Ok(Json(assignment))
}

/// Handler for POST `/assignments/{id}/complete`.
async fn handle_complete_assignment(
    AxumState(app_state): AxumState<AppState>,
    Path(assignment_id): Path<i64>,
) -> Result<Json<Assignment>, HttpError> {
    info!(assignment_id, "Handling complete_assignment request");

    let mut persistence = app_state.persistence.lock().await;
    let assignment: Assignment = rescue_dispatch_api::complete_assignment(
        &mut persistence,
        assignment_id,
        current_time_millis(),
    )?;
    drop(persistence);

    app_state.live.broadcast(assignment_resolved(&assignment));
    Ok(Json(assignment))
}

/// Handler for GET `/rescuers/{id}/assignments`.
async fn handle_list_rescuer_assignments(
    AxumState(app_state): AxumState<AppState>,
    Path(rescuer_id): Path<i64>,
) -> Result<Json<ListAssignmentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_rescuer_assignments(
        &mut persistence,
        rescuer_id,
    )?))
}

// ============================================================================
// Active pointer
// ============================================================================

/// Handler for GET `/active`.
async fn handle_get_active_pointer(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ActivePointerResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_active_pointer(
        &mut persistence,
        &app_state.pointer_scope,
    )?))
}

/// Handler for POST `/active`.
async fn handle_update_active_pointer(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<UpdateActivePointerRequest>,
) -> Result<Json<ActivePointerResponse>, HttpError> {
    debug!(?req, "Handling update_active_pointer request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ActivePointerResponse = rescue_dispatch_api::update_active_pointer(
        &mut persistence,
        &app_state.pointer_scope,
        req,
        current_time_millis(),
    )?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::ActivePointerChanged {
        scope: response.scope.clone(),
        active_dispatcher_id: response.active_dispatcher_id,
        active_incident_id: response.active_incident_id,
    });
    Ok(Json(response))
}

// ============================================================================
// Reference entities
// ============================================================================

/// Handler for POST `/dispatchers`.
async fn handle_create_dispatcher(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<NewDispatcher>,
) -> Result<Json<Dispatcher>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::create_dispatcher(
        &mut persistence,
        &req,
        current_time_millis(),
    )?))
}

/// Handler for GET `/dispatchers`.
async fn handle_list_dispatchers(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListDispatchersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_dispatchers(&mut persistence)?))
}

/// Handler for GET `/dispatchers/{id}`.
async fn handle_get_dispatcher(
    AxumState(app_state): AxumState<AppState>,
    Path(dispatcher_id): Path<i64>,
) -> Result<Json<Dispatcher>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_dispatcher(
        &mut persistence,
        dispatcher_id,
    )?))
}

/// Handler for POST `/rescuers`.
async fn handle_create_rescuer(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<NewRescuer>,
) -> Result<Json<Rescuer>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::create_rescuer(
        &mut persistence,
        &req,
        current_time_millis(),
    )?))
}

/// Handler for GET `/rescuers`.
async fn handle_list_rescuers(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListRescuersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_rescuers(&mut persistence)?))
}

/// Handler for GET `/rescuers/{id}`.
async fn handle_get_rescuer(
    AxumState(app_state): AxumState<AppState>,
    Path(rescuer_id): Path<i64>,
) -> Result<Json<Rescuer>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_rescuer(
        &mut persistence,
        rescuer_id,
    )?))
}

/// Handler for PUT `/rescuers/{id}/location`.
async fn handle_update_rescuer_location(
    AxumState(app_state): AxumState<AppState>,
    Path(rescuer_id): Path<i64>,
    Json(location): Json<RescuerLocation>,
) -> Result<Json<Rescuer>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::update_rescuer_location(
        &mut persistence,
        rescuer_id,
        location,
        current_time_millis(),
    )?))
}

/// Handler for POST `/patients`.
async fn handle_create_patient(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<NewPatient>,
) -> Result<Json<Patient>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::create_patient(
        &mut persistence,
        &req,
        current_time_millis(),
    )?))
}

/// Handler for GET `/patients`.
async fn handle_list_patients(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ListPatientsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::list_patients(
        &mut persistence,
        query.limit,
    )?))
}

/// Handler for GET `/patients/{id}`.
async fn handle_get_patient(
    AxumState(app_state): AxumState<AppState>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Patient>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rescue_dispatch_api::get_patient(
        &mut persistence,
        patient_id,
    )?))
}

// ============================================================================
// System
// ============================================================================

/// Handler for GET `/system/now`.
#[allow(clippy::unused_async)]
async fn handle_server_time() -> Result<Json<ServerTimeResponse>, HttpError> {
    Ok(Json(rescue_dispatch_api::server_time(current_time_millis())?))
}

/// Handler for POST `/admin/clear`.
async fn handle_clear_all(
    AxumState(app_state): AxumState<AppState>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    rescue_dispatch_api::clear_all(&mut persistence)?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::DataCleared);
    Ok(StatusCode::NO_CONTENT)
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/incidents", get(handle_list_incidents))
        .route("/incidents/upsert", post(handle_upsert_incident))
        .route("/incidents/incoming", get(handle_list_incoming))
        .route("/incidents/active", get(handle_list_active))
        .route(
            "/incidents/by_session/{session_id}",
            get(handle_get_incident_by_session),
        )
        .route(
            "/incidents/find_by_session/{session_id}",
            get(handle_find_by_session),
        )
        .route(
            "/incidents/{id}",
            get(handle_get_incident).delete(handle_delete_incident),
        )
        .route("/incidents/{id}/overview", get(handle_get_incident_overview))
        .route("/incidents/{id}/accept", post(handle_accept_call))
        .route("/incidents/{id}/confirm", post(handle_confirm_emergency))
        .route("/incidents/{id}/end", post(handle_end_incident_call))
        .route("/incidents/{id}/cancel", post(handle_cancel_incident))
        .route(
            "/incidents/{id}/transcript",
            get(handle_get_transcript)
                .post(handle_append_chunk)
                .put(handle_replace_transcript),
        )
        .route(
            "/incidents/{id}/assignments",
            get(handle_list_incident_assignments).post(handle_offer_assignment),
        )
        .route("/calls/start", post(handle_start_call))
        .route("/calls/end", post(handle_end_call))
        .route("/assignments/pending", get(handle_list_pending_offers))
        .route("/assignments/{id}/accept", post(handle_accept_assignment))
        .route("/assignments/{id}/reject", post(handle_reject_assignment))
        .route("/assignments/{id}/cancel", post(handle_cancel_assignment))
        .route("/assignments/{id}/complete", post(handle_complete_assignment))
        .route(
            "/active",
            get(handle_get_active_pointer).post(handle_update_active_pointer),
        )
        .route(
            "/dispatchers",
            get(handle_list_dispatchers).post(handle_create_dispatcher),
        )
        .route("/dispatchers/{id}", get(handle_get_dispatcher))
        .route(
            "/rescuers",
            get(handle_list_rescuers).post(handle_create_rescuer),
        )
        .route("/rescuers/{id}", get(handle_get_rescuer))
        .route("/rescuers/{id}/location", put(handle_update_rescuer_location))
        .route(
            "/rescuers/{id}/assignments",
            get(handle_list_rescuer_assignments),
        )
        .route(
            "/patients",
            get(handle_list_patients).post(handle_create_patient),
        )
        .route("/patients/{id}", get(handle_get_patient))
        .route("/system/now", get(handle_server_time))
        .route("/admin/clear", post(handle_clear_all))
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

fn open_persistence(args: &Args) -> Result<Persistence, PersistenceError> {
    #[cfg(feature = "mysql")]
    if let Some(url) = &args.mysql_url {
        info!("Using MySQL/MariaDB database");
        return Persistence::new_with_mysql(url);
    }

    if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Rescue Dispatch Server");

    let mut persistence: Persistence = open_persistence(&args)?;
    persistence.verify_foreign_key_enforcement()?;

    info!(
        pointer_scope = %args.pointer_scope,
        reject_policy = args.reject_policy.as_str(),
        "Dispatch configuration"
    );

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        pointer_scope: Arc::from(args.pointer_scope.as_str()),
        reject_policy: args.reject_policy,
        live: Arc::new(LiveEventBroadcaster::new()),
    };

    let app: Router = build_router(app_state);

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state(reject_policy: RejectPolicy) -> AppState {
        let persistence: Persistence =
            Persistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            pointer_scope: Arc::from(DEFAULT_POINTER_SCOPE),
            reject_policy,
            live: Arc::new(LiveEventBroadcaster::new()),
        }
    }

    /// Sends one request and returns the status and decoded JSON body.
    ///
    /// Empty bodies decode to `Value::Null`.
    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (HttpStatusCode, Value) {
        let request: Request<Body> = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status: HttpStatusCode = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };
        (status, value)
    }

    /// Creates a dispatcher and a confirmed incident with an open offer.
    ///
    /// Returns `(dispatcher_id, incident_id, assignment_id)`.
    async fn bootstrap_confirmed_incident(app: &Router, session: &str) -> (i64, i64, i64) {
        let (_, dispatcher) = send(
            app,
            "POST",
            "/dispatchers",
            Some(json!({ "name": "Camila Rojas" })),
        )
        .await;
        let dispatcher_id: i64 = dispatcher["dispatcher_id"].as_i64().unwrap();

        let (status, started) = send(
            app,
            "POST",
            "/calls/start",
            Some(json!({
                "call_session_id": session,
                "dispatcher_id": dispatcher_id,
                "caller_phone": "+56 9 5555 0101",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        let incident_id: i64 = started["incident_id"].as_i64().unwrap();

        let (status, _) = send(
            app,
            "POST",
            &format!("/incidents/{incident_id}/accept"),
            Some(json!({ "dispatcher_id": dispatcher_id })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, confirmed) = send(
            app,
            "POST",
            &format!("/incidents/{incident_id}/confirm"),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(confirmed["incident"]["status"], "confirmed");
        let assignment_id: i64 = confirmed["assignment"]["assignment_id"].as_i64().unwrap();

        (dispatcher_id, incident_id, assignment_id)
    }

    async fn create_rescuer(app: &Router, name: &str) -> i64 {
        let (status, rescuer) = send(app, "POST", "/rescuers", Some(json!({ "name": name }))).await;
        assert_eq!(status, HttpStatusCode::OK);
        rescuer["rescuer_id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_first_rescuer_wins_the_claim() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));
        let (_, incident_id, assignment_id) =
            bootstrap_confirmed_incident(&app, "session-claim").await;
        let first: i64 = create_rescuer(&app, "SAMU 3").await;
        let second: i64 = create_rescuer(&app, "SAMU 7").await;

        let (status, won) = send(
            &app,
            "POST",
            &format!("/assignments/{assignment_id}/accept"),
            Some(json!({ "rescuer_id": first })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(won["assignment"]["status"], "accepted");
        assert_eq!(won["incident"]["status"], "rescuer_assigned");

        let (status, lost) = send(
            &app,
            "POST",
            &format!("/assignments/{assignment_id}/accept"),
            Some(json!({ "rescuer_id": second })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(lost["error"], true);
        assert_eq!(lost["kind"], "already_claimed");

        let (_, overview) = send(
            &app,
            "GET",
            &format!("/incidents/{incident_id}/overview"),
            None,
        )
        .await;
        assert_eq!(overview["assignment"]["rescuer_id"], first);
        assert_eq!(overview["dispatcher"]["name"], "Camila Rojas");

        let (_, rescuer) = send(&app, "GET", &format!("/rescuers/{first}"), None).await;
        assert_eq!(rescuer["status"], "on_call");
    }

    #[tokio::test]
    async fn test_claim_is_broadcast_to_live_subscribers() {
        let app_state: AppState = create_test_app_state(RejectPolicy::AwaitDispatcher);
        let mut rx = app_state.live.subscribe();
        let app: Router = build_router(app_state);
        let (_, incident_id, assignment_id) =
            bootstrap_confirmed_incident(&app, "session-live").await;
        let rescuer_id: i64 = create_rescuer(&app, "SAMU 3").await;

        send(
            &app,
            "POST",
            &format!("/assignments/{assignment_id}/accept"),
            Some(json!({ "rescuer_id": rescuer_id })),
        )
        .await;

        let mut events: Vec<LiveEvent> = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(events.contains(&LiveEvent::AssignmentOffered {
            assignment_id,
            incident_id,
        }));
        assert!(events.contains(&LiveEvent::AssignmentClaimed {
            assignment_id,
            incident_id,
            rescuer_id,
        }));
    }

    #[tokio::test]
    async fn test_unknown_incident_is_not_found() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));

        let (status, body) = send(&app, "GET", "/incidents/4242", None).await;
        assert_eq!(status, HttpStatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, _) = send(&app, "POST", "/incidents/4242/cancel", None).await;
        assert_eq!(status, HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_session_is_rejected() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));
        let (_, dispatcher) = send(
            &app,
            "POST",
            "/dispatchers",
            Some(json!({ "name": "Camila Rojas" })),
        )
        .await;

        let (status, body) = send(
            &app,
            "POST",
            "/incidents/upsert",
            Some(json!({
                "call_session_id": "   ",
                "dispatcher_id": dispatcher["dispatcher_id"],
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        let (_, listed) = send(&app, "GET", "/incidents", None).await;
        assert_eq!(listed["incidents"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_transition_is_conflict() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));
        let (_, incident_id, _) = bootstrap_confirmed_incident(&app, "session-cancel").await;

        let (status, cancelled) = send(
            &app,
            "POST",
            &format!("/incidents/{incident_id}/cancel"),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(cancelled["incident"]["status"], "cancelled");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/incidents/{incident_id}/cancel"),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(body["kind"], "invalid_transition");
    }

    #[tokio::test]
    async fn test_reject_with_reoffer_opens_new_offer() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::Reoffer));
        let (_, incident_id, assignment_id) =
            bootstrap_confirmed_incident(&app, "session-reoffer").await;

        let (status, rejected) = send(
            &app,
            "POST",
            &format!("/assignments/{assignment_id}/reject"),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(rejected["assignment"]["status"], "rejected");
        let reoffer_id: i64 = rejected["reoffer"]["assignment_id"].as_i64().unwrap();
        assert_ne!(reoffer_id, assignment_id);

        let (_, board) = send(&app, "GET", "/assignments/pending", None).await;
        let pending: &Vec<Value> = board["assignments"].as_array().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["assignment_id"], reoffer_id);
        assert_eq!(pending[0]["incident_id"], incident_id);
    }

    #[tokio::test]
    async fn test_active_pointer_null_clears_incident() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));
        let (dispatcher_id, incident_id, _) =
            bootstrap_confirmed_incident(&app, "session-pointer").await;

        let (status, empty) = send(&app, "GET", "/active", None).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(empty["active_incident_id"], Value::Null);

        let (status, set) = send(
            &app,
            "POST",
            "/active",
            Some(json!({
                "active_dispatcher_id": dispatcher_id,
                "active_incident_id": incident_id,
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(set["scope"], DEFAULT_POINTER_SCOPE);
        assert_eq!(set["active_incident_id"], incident_id);

        let (status, cleared) = send(
            &app,
            "POST",
            "/active",
            Some(json!({ "active_incident_id": null })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(cleared["active_incident_id"], Value::Null);
        assert_eq!(cleared["active_dispatcher_id"], dispatcher_id);
    }

    #[tokio::test]
    async fn test_transcript_append_and_read() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));
        let (_, incident_id, _) = bootstrap_confirmed_incident(&app, "session-transcript").await;

        for (offset, text) in [(4.5, "later"), (2.0, "earlier")] {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/incidents/{incident_id}/transcript"),
                Some(json!({ "offset": offset, "speaker": "caller", "text": text })),
            )
            .await;
            assert_eq!(status, HttpStatusCode::OK);
        }

        let (status, call) = send(
            &app,
            "GET",
            &format!("/incidents/{incident_id}/transcript"),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        let texts: Vec<&str> = call["chunks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|chunk| chunk["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts.last(), Some(&"later"));
        assert_eq!(texts[texts.len() - 2], "earlier");
    }

    #[tokio::test]
    async fn test_delete_and_clear_return_no_content() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));
        let (_, incident_id, _) = bootstrap_confirmed_incident(&app, "session-delete").await;

        let (status, _) = send(&app, "DELETE", &format!("/incidents/{incident_id}"), None).await;
        assert_eq!(status, HttpStatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/incidents/{incident_id}"), None).await;
        assert_eq!(status, HttpStatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/admin/clear", None).await;
        assert_eq!(status, HttpStatusCode::NO_CONTENT);

        let (_, dispatchers) = send(&app, "GET", "/dispatchers", None).await;
        assert_eq!(dispatchers["dispatchers"], json!([]));
    }

    #[tokio::test]
    async fn test_server_time_is_iso() {
        let app: Router = build_router(create_test_app_state(RejectPolicy::AwaitDispatcher));

        let (status, body) = send(&app, "GET", "/system/now", None).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert!(body["now"].as_i64().unwrap() > 0);
        assert!(body["iso"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_reject_policy_flag_parsing() {
        assert_eq!(parse_reject_policy("reoffer"), Ok(RejectPolicy::Reoffer));
        assert!(parse_reject_policy("sometimes").is_err());
    }
}
