// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their conversions to domain records.
//!
//! Enum-valued columns are stored as their `as_str` form. List and JSON
//! columns are stored as JSON text.

use diesel::prelude::*;
use rescue_dispatch_domain::{
    ActivePointer, Assignment, AssignmentStatus, AssignmentTimes, CallRecord, Dispatcher,
    EmergencyContact, Incident, IncidentStatus, NewPatient, Patient, Priority, Rescuer,
    RescuerStatus, Sex, TranscriptChunk,
};
use std::str::FromStr;

use crate::diesel_schema::{
    active_pointer, calls, dispatchers, incident_assignments, incidents, patients, rescuers,
};
use crate::error::PersistenceError;

fn parse_column<T: FromStr>(column: &'static str, value: &str) -> Result<T, PersistenceError>
where
    T::Err: std::fmt::Display,
{
    T::from_str(value)
        .map_err(|e| PersistenceError::InvalidRecord(format!("column {column}: {e}")))
}

/// Every incident column except the surrogate key.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = incidents, treat_none_as_null = true)]
pub struct IncidentFields {
    pub incident_number: Option<String>,
    pub call_session_id: String,
    pub status: String,
    pub priority: String,
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
    pub raw_canonical_data: Option<String>,
    pub created_at: i64,
    pub last_updated: i64,
}

impl IncidentFields {
    /// Converts a domain incident into its column values.
    ///
    /// An empty incident number is stored as `NULL` until the key is known.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw extractor payload cannot be serialized.
    pub fn from_incident(incident: &Incident) -> Result<Self, PersistenceError> {
        let raw_canonical_data: Option<String> = incident
            .raw_canonical_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            incident_number: Some(incident.incident_number.clone()).filter(|n| !n.is_empty()),
            call_session_id: incident.call_session_id.clone(),
            status: incident.status.as_str().to_string(),
            priority: incident.priority.as_str().to_string(),
            dispatcher_id: incident.dispatcher_id,
            patient_id: incident.patient_id,
            address: incident.address.clone(),
            city: incident.city.clone(),
            district: incident.district.clone(),
            reference: incident.reference.clone(),
            apartment: incident.apartment.clone(),
            latitude: incident.latitude,
            longitude: incident.longitude,
            first_name: incident.first_name.clone(),
            last_name: incident.last_name.clone(),
            patient_age: incident.patient_age,
            patient_sex: incident.patient_sex.clone(),
            consciousness: incident.consciousness.clone(),
            breathing: incident.breathing.clone(),
            avdi: incident.avdi.clone(),
            respiratory_status: incident.respiratory_status.clone(),
            symptom_onset: incident.symptom_onset.clone(),
            medical_history: incident.medical_history.clone(),
            current_medications: incident.current_medications.clone(),
            allergies: incident.allergies.clone(),
            vital_signs: incident.vital_signs.clone(),
            required_rescuers: incident.required_rescuers.clone(),
            required_resources: incident.required_resources.clone(),
            health_insurance: incident.health_insurance.clone(),
            concierge_notified: incident.concierge_notified.clone(),
            incident_type: incident.incident_type.clone(),
            description: incident.description.clone(),
            raw_canonical_data,
            created_at: incident.created_at,
            last_updated: incident.last_updated,
        })
    }
}

/// A full incident row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = incidents)]
pub struct IncidentRow {
    pub incident_id: i64,
    #[diesel(embed)]
    pub fields: IncidentFields,
}

impl IncidentRow {
    /// # Errors
    ///
    /// Returns an error if a stored enum or JSON value cannot be parsed.
    pub fn into_incident(self) -> Result<Incident, PersistenceError> {
        let f: IncidentFields = self.fields;
        let raw_canonical_data: Option<serde_json::Value> = f
            .raw_canonical_data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Incident {
            incident_id: self.incident_id,
            incident_number: f.incident_number.unwrap_or_default(),
            call_session_id: f.call_session_id,
            status: parse_column::<IncidentStatus>("incidents.status", &f.status)?,
            priority: parse_column::<Priority>("incidents.priority", &f.priority)?,
            dispatcher_id: f.dispatcher_id,
            patient_id: f.patient_id,
            address: f.address,
            city: f.city,
            district: f.district,
            reference: f.reference,
            apartment: f.apartment,
            latitude: f.latitude,
            longitude: f.longitude,
            first_name: f.first_name,
            last_name: f.last_name,
            patient_age: f.patient_age,
            patient_sex: f.patient_sex,
            consciousness: f.consciousness,
            breathing: f.breathing,
            avdi: f.avdi,
            respiratory_status: f.respiratory_status,
            symptom_onset: f.symptom_onset,
            medical_history: f.medical_history,
            current_medications: f.current_medications,
            allergies: f.allergies,
            vital_signs: f.vital_signs,
            required_rescuers: f.required_rescuers,
            required_resources: f.required_resources,
            health_insurance: f.health_insurance,
            concierge_notified: f.concierge_notified,
            incident_type: f.incident_type,
            description: f.description,
            raw_canonical_data,
            created_at: f.created_at,
            last_updated: f.last_updated,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = calls)]
pub struct CallRow {
    pub call_id: i64,
    pub incident_id: i64,
    pub caller_phone: Option<String>,
    pub chunks_json: String,
    pub transcription: String,
    pub revision: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CallRow {
    /// # Errors
    ///
    /// Returns an error if the stored chunk list is not valid JSON.
    pub fn into_call(self) -> Result<CallRecord, PersistenceError> {
        let chunks: Vec<TranscriptChunk> = serde_json::from_str(&self.chunks_json)?;
        Ok(CallRecord {
            call_id: self.call_id,
            incident_id: self.incident_id,
            caller_phone: self.caller_phone,
            chunks,
            transcription: self.transcription,
            revision: self.revision,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = incident_assignments)]
pub struct AssignmentRow {
    pub assignment_id: i64,
    pub incident_id: i64,
    pub rescuer_id: Option<i64>,
    pub status: String,
    pub offered_at: i64,
    pub responded_at: Option<i64>,
    pub accepted_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl AssignmentRow {
    /// # Errors
    ///
    /// Returns an error if the stored status is unknown.
    pub fn into_assignment(self) -> Result<Assignment, PersistenceError> {
        Ok(Assignment {
            assignment_id: self.assignment_id,
            incident_id: self.incident_id,
            rescuer_id: self.rescuer_id,
            status: parse_column::<AssignmentStatus>("incident_assignments.status", &self.status)?,
            times: AssignmentTimes {
                offered: self.offered_at,
                responded: self.responded_at,
                accepted: self.accepted_at,
                completed: self.completed_at,
            },
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = active_pointer)]
pub struct PointerRow {
    pub pointer_key: String,
    pub active_dispatcher_id: Option<i64>,
    pub active_incident_id: Option<i64>,
    pub updated_at: i64,
}

impl From<PointerRow> for ActivePointer {
    fn from(row: PointerRow) -> Self {
        Self {
            scope: row.pointer_key,
            active_dispatcher_id: row.active_dispatcher_id,
            active_incident_id: row.active_incident_id,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = dispatchers)]
pub struct DispatcherRow {
    pub dispatcher_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: i64,
}

impl From<DispatcherRow> for Dispatcher {
    fn from(row: DispatcherRow) -> Self {
        Self {
            dispatcher_id: row.dispatcher_id,
            name: row.name,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rescuers)]
pub struct RescuerRow {
    pub rescuer_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_updated_at: Option<i64>,
    pub created_at: i64,
}

impl RescuerRow {
    /// # Errors
    ///
    /// Returns an error if the stored status is unknown.
    pub fn into_rescuer(self) -> Result<Rescuer, PersistenceError> {
        Ok(Rescuer {
            rescuer_id: self.rescuer_id,
            name: self.name,
            phone: self.phone,
            status: parse_column::<RescuerStatus>("rescuers.status", &self.status)?,
            latitude: self.latitude,
            longitude: self.longitude,
            location_updated_at: self.location_updated_at,
            created_at: self.created_at,
        })
    }
}

/// Patient columns except the surrogate key.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = patients)]
pub struct PatientFields {
    pub rut: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub medical_history_json: String,
    pub medications_json: String,
    pub allergies_json: String,
    pub blood_type: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PatientFields {
    /// # Errors
    ///
    /// Returns an error if a list field cannot be serialized.
    pub fn from_new(patient: &NewPatient, now: i64) -> Result<Self, PersistenceError> {
        Ok(Self {
            rut: patient.rut.clone(),
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            age: patient.age,
            sex: patient.sex.map(|s| s.as_str().to_string()),
            phone: patient.phone.clone(),
            address: patient.address.clone(),
            city: patient.city.clone(),
            district: patient.district.clone(),
            latitude: patient.latitude,
            longitude: patient.longitude,
            medical_history_json: serde_json::to_string(&patient.medical_history)?,
            medications_json: serde_json::to_string(&patient.medications)?,
            allergies_json: serde_json::to_string(&patient.allergies)?,
            blood_type: patient.blood_type.clone(),
            emergency_contact_name: patient.emergency_contact.as_ref().map(|c| c.name.clone()),
            emergency_contact_phone: patient.emergency_contact.as_ref().map(|c| c.phone.clone()),
            photo_url: patient.photo_url.clone(),
            notes: patient.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = patients)]
pub struct PatientRow {
    pub patient_id: i64,
    #[diesel(embed)]
    pub fields: PatientFields,
}

impl PatientRow {
    /// # Errors
    ///
    /// Returns an error if a stored enum or list value cannot be parsed.
    pub fn into_patient(self) -> Result<Patient, PersistenceError> {
        let f: PatientFields = self.fields;
        let emergency_contact: Option<EmergencyContact> =
            match (f.emergency_contact_name, f.emergency_contact_phone) {
                (Some(name), Some(phone)) => Some(EmergencyContact { name, phone }),
                _ => None,
            };
        let sex: Option<Sex> = f
            .sex
            .as_deref()
            .map(|s| parse_column::<Sex>("patients.sex", s))
            .transpose()?;

        Ok(Patient {
            patient_id: self.patient_id,
            profile: NewPatient {
                rut: f.rut,
                first_name: f.first_name,
                last_name: f.last_name,
                age: f.age,
                sex,
                phone: f.phone,
                address: f.address,
                city: f.city,
                district: f.district,
                latitude: f.latitude,
                longitude: f.longitude,
                medical_history: serde_json::from_str(&f.medical_history_json)?,
                medications: serde_json::from_str(&f.medications_json)?,
                allergies: serde_json::from_str(&f.allergies_json)?,
                blood_type: f.blood_type,
                emergency_contact,
                photo_url: f.photo_url,
                notes: f.notes,
            },
            created_at: f.created_at,
            updated_at: f.updated_at,
        })
    }
}
