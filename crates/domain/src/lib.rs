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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod assignment;
mod error;
mod incident;
mod pointer;
mod profiles;
mod transcript;
mod validation;

#[cfg(test)]
mod tests;

pub use assignment::{Assignment, AssignmentStatus, AssignmentTimes};
pub use error::DomainError;
pub use incident::{
    DEFAULT_ADDRESS, Incident, IncidentPatch, IncidentStatus, Priority, format_incident_number,
};
pub use pointer::{ActivePointer, ActivePointerPatch, DEFAULT_POINTER_SCOPE};
pub use profiles::{
    Dispatcher, EmergencyContact, NewDispatcher, NewPatient, NewRescuer, Patient, Rescuer,
    RescuerLocation, RescuerStatus, Sex,
};
pub use transcript::{CallRecord, INCOMING_CALL_NOTICE, Speaker, TranscriptChunk};
pub use validation::{
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, MAX_SESSION_ID_LEN, resolve_limit, validate_coordinates,
    validate_id, validate_name, validate_session_id,
};
