// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dispatcher, rescuer and patient writes.

use diesel::prelude::*;
use rescue_dispatch_domain::{
    Dispatcher, NewDispatcher, NewPatient, NewRescuer, Patient, Rescuer, RescuerLocation,
    RescuerStatus,
};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::{PatientFields, PatientRow};
use crate::diesel_schema::{dispatchers, patients, rescuers};
use crate::error::PersistenceError;

backend_fn! {
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_dispatcher(
    conn: &mut _,
    dispatcher: &NewDispatcher,
    now: i64,
) -> Result<Dispatcher, PersistenceError> {
    diesel::insert_into(dispatchers::table)
        .values((
            dispatchers::name.eq(&dispatcher.name),
            dispatchers::phone.eq(&dispatcher.phone),
            dispatchers::created_at.eq(now),
        ))
        .execute(conn)?;

    let dispatcher_id: i64 = conn.get_last_insert_rowid()?;
    info!(dispatcher_id, name = %dispatcher.name, "Created dispatcher");

    Ok(Dispatcher {
        dispatcher_id,
        name: dispatcher.name.clone(),
        phone: dispatcher.phone.clone(),
        created_at: now,
    })
}
}

backend_fn! {
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_rescuer(
    conn: &mut _,
    rescuer: &NewRescuer,
    now: i64,
) -> Result<Rescuer, PersistenceError> {
    let status: RescuerStatus = RescuerStatus::default();

    diesel::insert_into(rescuers::table)
        .values((
            rescuers::name.eq(&rescuer.name),
            rescuers::phone.eq(&rescuer.phone),
            rescuers::status.eq(status.as_str()),
            rescuers::created_at.eq(now),
        ))
        .execute(conn)?;

    let rescuer_id: i64 = conn.get_last_insert_rowid()?;
    info!(rescuer_id, name = %rescuer.name, "Created rescuer");

    Ok(Rescuer {
        rescuer_id,
        name: rescuer.name.clone(),
        phone: rescuer.phone.clone(),
        status,
        latitude: None,
        longitude: None,
        location_updated_at: None,
        created_at: now,
    })
}
}

backend_fn! {
/// # Returns
///
/// `true` if the rescuer exists.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_rescuer_status(
    conn: &mut _,
    rescuer_id: i64,
    status: RescuerStatus,
) -> Result<bool, PersistenceError> {
    let rows: usize = diesel::update(rescuers::table.find(rescuer_id))
        .set(rescuers::status.eq(status.as_str()))
        .execute(conn)?;
    debug!(rescuer_id, status = status.as_str(), "Set rescuer status");
    Ok(rows > 0)
}
}

backend_fn! {
/// # Returns
///
/// `true` if the rescuer exists.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_rescuer_location(
    conn: &mut _,
    rescuer_id: i64,
    location: RescuerLocation,
    now: i64,
) -> Result<bool, PersistenceError> {
    let rows: usize = diesel::update(rescuers::table.find(rescuer_id))
        .set((
            rescuers::latitude.eq(location.latitude),
            rescuers::longitude.eq(location.longitude),
            rescuers::location_updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(rows > 0)
}
}

backend_fn! {
/// # Errors
///
/// Returns an error if a list field cannot be serialized or the insert fails.
pub fn insert_patient(
    conn: &mut _,
    patient: &NewPatient,
    now: i64,
) -> Result<Patient, PersistenceError> {
    let fields: PatientFields = PatientFields::from_new(patient, now)?;

    diesel::insert_into(patients::table)
        .values(&fields)
        .execute(conn)?;

    let patient_id: i64 = conn.get_last_insert_rowid()?;
    info!(patient_id, "Created patient");

    PatientRow { patient_id, fields }.into_patient()
}
}
