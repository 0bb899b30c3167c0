// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use rescue_dispatch_domain::{
    DEFAULT_ADDRESS, Incident, IncidentPatch, IncidentStatus, validate_id, validate_session_id,
};

/// Result of planning an upsert against the currently stored incident.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// No incident exists for the session; insert this one.
    Created(Incident),
    /// The stored incident with the patch merged in.
    Merged(Incident),
    /// The stored incident is terminal; nothing is written.
    Frozen(Incident),
}

impl UpsertOutcome {
    /// The incident as it will read after the upsert commits.
    #[must_use]
    pub const fn incident(&self) -> &Incident {
        match self {
            Self::Created(incident) | Self::Merged(incident) | Self::Frozen(incident) => incident,
        }
    }
}

/// Returns the next modification stamp.
///
/// Stamps strictly increase per record even when the clock has not advanced.
#[must_use]
pub const fn next_stamp(previous: i64, now: i64) -> i64 {
    if now > previous {
        now
    } else {
        previous.saturating_add(1)
    }
}

/// Validates the inputs of an upsert before any store access.
///
/// # Errors
///
/// Returns an error if the session id or dispatcher id is malformed, or if
/// the patch carries invalid values.
pub fn validate_upsert(
    call_session_id: &str,
    dispatcher_id: i64,
    patch: &IncidentPatch,
) -> Result<(), CoreError> {
    validate_session_id(call_session_id)?;
    validate_id("dispatcher", dispatcher_id)?;
    patch.validate()?;
    Ok(())
}

/// Builds a fresh incident for a session seen for the first time.
///
/// The store assigns `incident_id` and `incident_number` on insert.
#[must_use]
pub fn new_incident(
    call_session_id: &str,
    dispatcher_id: i64,
    patch: &IncidentPatch,
    now: i64,
) -> Incident {
    let mut incident: Incident = Incident {
        incident_id: 0,
        incident_number: String::new(),
        call_session_id: call_session_id.to_string(),
        status: IncidentStatus::IncomingCall,
        priority: patch.priority.unwrap_or_default(),
        dispatcher_id,
        patient_id: None,
        address: Some(String::from(DEFAULT_ADDRESS)),
        city: None,
        district: None,
        reference: None,
        apartment: None,
        latitude: None,
        longitude: None,
        first_name: None,
        last_name: None,
        patient_age: None,
        patient_sex: None,
        consciousness: None,
        breathing: None,
        avdi: None,
        respiratory_status: None,
        symptom_onset: None,
        medical_history: None,
        current_medications: None,
        allergies: None,
        vital_signs: None,
        required_rescuers: None,
        required_resources: None,
        health_insurance: None,
        concierge_notified: None,
        incident_type: None,
        description: None,
        raw_canonical_data: None,
        created_at: now,
        last_updated: now,
    };
    patch.merge_into(&mut incident);
    incident
}

/// Plans an upsert for a call session.
///
/// The dispatcher id only applies on creation; ownership of an existing
/// incident changes through call acceptance.
///
/// # Arguments
///
/// * `existing` - The incident currently stored for the session, if any
/// * `call_session_id` - The session key
/// * `dispatcher_id` - The dispatcher recorded on creation
/// * `patch` - The extracted facts to merge
/// * `now` - Current time, epoch milliseconds
///
/// # Errors
///
/// Returns an error if the inputs fail validation.
pub fn plan_upsert(
    existing: Option<&Incident>,
    call_session_id: &str,
    dispatcher_id: i64,
    patch: &IncidentPatch,
    now: i64,
) -> Result<UpsertOutcome, CoreError> {
    validate_upsert(call_session_id, dispatcher_id, patch)?;

    let Some(current) = existing else {
        return Ok(UpsertOutcome::Created(new_incident(
            call_session_id,
            dispatcher_id,
            patch,
            now,
        )));
    };

    if current.status.is_terminal() {
        return Ok(UpsertOutcome::Frozen(current.clone()));
    }

    let mut merged: Incident = current.clone();
    patch.merge_into(&mut merged);
    merged.last_updated = next_stamp(current.last_updated, now);
    Ok(UpsertOutcome::Merged(merged))
}
