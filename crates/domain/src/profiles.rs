// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference entities: dispatchers, rescuers and patients.
//!
//! These are consumed by the engine but never computed by it.

use crate::error::DomainError;
use crate::validation::{validate_coordinates, validate_name};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatcher {
    pub dispatcher_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDispatcher {
    pub name: String,
    pub phone: Option<String>,
}

impl NewDispatcher {
    /// # Errors
    ///
    /// Returns an error if the name is blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name("name", &self.name)
    }
}

/// Rescuer availability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescuerStatus {
    #[default]
    Available,
    OnCall,
}

impl RescuerStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::OnCall => "on_call",
        }
    }
}

impl FromStr for RescuerStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "on_call" => Ok(Self::OnCall),
            _ => Err(DomainError::InvalidStatus {
                kind: "rescuer status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rescuer {
    pub rescuer_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub status: RescuerStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_updated_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRescuer {
    pub name: String,
    pub phone: Option<String>,
}

impl NewRescuer {
    /// # Errors
    ///
    /// Returns an error if the name is blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name("name", &self.name)
    }
}

/// Last known rescuer position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RescuerLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl RescuerLocation {
    /// # Errors
    ///
    /// Returns an error if either coordinate is out of range.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Patient sex as recorded on the patient profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    Other,
}

impl Sex {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "Other",
        }
    }
}

impl FromStr for Sex {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            "Other" => Ok(Self::Other),
            _ => Err(DomainError::InvalidStatus {
                kind: "sex",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

/// Patient profile fields shared by creation requests and stored records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPatient {
    pub rut: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub blood_type: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

impl NewPatient {
    /// # Errors
    ///
    /// Returns an error if:
    /// - first or last name is blank
    /// - age is outside `0..=150`
    /// - coordinates are out of range, or only one is supplied
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        if let Some(age) = self.age {
            if !(0..=150).contains(&age) {
                return Err(DomainError::InvalidPatientAge(age));
            }
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => validate_coordinates(latitude, longitude),
            (None, None) => Ok(()),
            _ => Err(DomainError::IncompleteCoordinates),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    #[serde(flatten)]
    pub profile: NewPatient,
    pub created_at: i64,
    pub updated_at: i64,
}
