// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Incident record, status and priority types.
//!
//! An incident is keyed by its call-session identifier and filled in
//! incrementally as extracted facts arrive. Status changes are driven
//! exclusively by dispatcher actions and assignment arbitration.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Address recorded when an incident is created without one.
pub const DEFAULT_ADDRESS: &str = "Unknown";

/// Incident lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    /// Call is ringing or in progress; no dispatcher has taken it yet
    IncomingCall,
    /// A dispatcher accepted the call
    Confirmed,
    /// A rescuer claimed the assignment
    RescuerAssigned,
    /// Rescuer is on scene
    InProgress,
    /// Call ended normally
    Completed,
    /// Incident was cancelled
    Cancelled,
}

impl IncidentStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IncomingCall => "incoming_call",
            Self::Confirmed => "confirmed",
            Self::RescuerAssigned => "rescuer_assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "incoming_call" => Ok(Self::IncomingCall),
            "confirmed" => Ok(Self::Confirmed),
            "rescuer_assigned" => Ok(Self::RescuerAssigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidStatus {
                kind: "incident status",
                value: s.to_string(),
            }),
        }
    }

    /// Returns true if the incident can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if a dispatcher has taken the incident and it is still open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::RescuerAssigned | Self::InProgress
        )
    }

    /// Statuses reported by the active-incidents listing.
    pub const ACTIVE: [Self; 3] = [Self::Confirmed, Self::RescuerAssigned, Self::InProgress];
}

impl FromStr for IncidentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Returns the string representation of the priority.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(DomainError::InvalidStatus {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// The canonical incident record.
///
/// All descriptive fields are optional; they are filled in as facts
/// are extracted from the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: i64,
    pub incident_number: String,
    pub call_session_id: String,
    pub status: IncidentStatus,
    pub priority: Priority,
    pub dispatcher_id: i64,
    pub patient_id: Option<i64>,

    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub reference: Option<String>,
    pub apartment: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_sex: Option<String>,
    pub consciousness: Option<String>,
    pub breathing: Option<String>,
    pub avdi: Option<String>,
    pub respiratory_status: Option<String>,
    pub symptom_onset: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub vital_signs: Option<String>,

    pub required_rescuers: Option<String>,
    pub required_resources: Option<String>,
    pub health_insurance: Option<String>,
    pub concierge_notified: Option<String>,
    pub incident_type: Option<String>,
    pub description: Option<String>,
    pub raw_canonical_data: Option<serde_json::Value>,

    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Strictly increasing modification stamp, epoch milliseconds.
    pub last_updated: i64,
}

/// A partial set of incident facts.
///
/// Absent fields never overwrite stored values. A supplied value always
/// overwrites, even when it equals the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncidentPatch {
    pub priority: Option<Priority>,
    pub patient_id: Option<i64>,

    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub reference: Option<String>,
    pub apartment: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_sex: Option<String>,
    pub consciousness: Option<String>,
    pub breathing: Option<String>,
    pub avdi: Option<String>,
    pub respiratory_status: Option<String>,
    pub symptom_onset: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub vital_signs: Option<String>,

    pub required_rescuers: Option<String>,
    pub required_resources: Option<String>,
    pub health_insurance: Option<String>,
    pub concierge_notified: Option<String>,
    pub incident_type: Option<String>,
    pub description: Option<String>,
    pub raw_canonical_data: Option<serde_json::Value>,
}

/// Copies every supplied optional field from a patch onto an incident.
macro_rules! merge_optional_fields {
    ($incident:expr, $patch:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$patch.$field {
                $incident.$field = Some(value.clone());
            }
        )*
    };
}

impl IncidentPatch {
    /// Validates the supplied values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `patient_id` is not positive
    /// - `patient_age` is outside `0..=150`
    /// - coordinates are out of range, or only one of them is supplied
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(patient_id) = self.patient_id {
            crate::validation::validate_id("patient", patient_id)?;
        }
        if let Some(age) = self.patient_age {
            if !(0..=150).contains(&age) {
                return Err(DomainError::InvalidPatientAge(age));
            }
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                crate::validation::validate_coordinates(latitude, longitude)
            }
            (None, None) => Ok(()),
            _ => Err(DomainError::IncompleteCoordinates),
        }
    }

    /// Returns true if no field is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merges the supplied fields into `incident`, leaving absent ones untouched.
    pub fn merge_into(&self, incident: &mut Incident) {
        if let Some(priority) = self.priority {
            incident.priority = priority;
        }
        merge_optional_fields!(
            incident,
            self,
            [
                patient_id,
                address,
                city,
                district,
                reference,
                apartment,
                latitude,
                longitude,
                first_name,
                last_name,
                patient_age,
                patient_sex,
                consciousness,
                breathing,
                avdi,
                respiratory_status,
                symptom_onset,
                medical_history,
                current_medications,
                allergies,
                vital_signs,
                required_rescuers,
                required_resources,
                health_insurance,
                concierge_notified,
                incident_type,
                description,
                raw_canonical_data,
            ]
        );
    }
}

/// Formats the human-readable incident number, e.g. `INC-2026-0042`.
///
/// The year is taken from `created_at` (epoch milliseconds, UTC).
#[must_use]
pub fn format_incident_number(incident_id: i64, created_at: i64) -> String {
    let year: i32 =
        time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(created_at) * 1_000_000)
            .map_or(1970, time::OffsetDateTime::year);
    format!("INC-{year}-{incident_id:04}")
}
