// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dispatcher, rescuer and patient queries.

use diesel::prelude::*;
use rescue_dispatch_domain::{Dispatcher, Patient, Rescuer};

use crate::data_models::{DispatcherRow, PatientRow, RescuerRow};
use crate::diesel_schema::{dispatchers, patients, rescuers};
use crate::error::PersistenceError;

backend_fn! {
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_dispatcher(
    conn: &mut _,
    dispatcher_id: i64,
) -> Result<Option<Dispatcher>, PersistenceError> {
    let row: Option<DispatcherRow> = dispatchers::table
        .find(dispatcher_id)
        .select(DispatcherRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(Dispatcher::from))
}
}

backend_fn! {
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_dispatchers(conn: &mut _) -> Result<Vec<Dispatcher>, PersistenceError> {
    let rows: Vec<DispatcherRow> = dispatchers::table
        .select(DispatcherRow::as_select())
        .order(dispatchers::dispatcher_id.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(Dispatcher::from).collect())
}
}

backend_fn! {
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded.
pub fn load_rescuer(conn: &mut _, rescuer_id: i64) -> Result<Option<Rescuer>, PersistenceError> {
    rescuers::table
        .find(rescuer_id)
        .select(RescuerRow::as_select())
        .first(conn)
        .optional()?
        .map(RescuerRow::into_rescuer)
        .transpose()
}
}

backend_fn! {
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_rescuers(conn: &mut _) -> Result<Vec<Rescuer>, PersistenceError> {
    let rows: Vec<RescuerRow> = rescuers::table
        .select(RescuerRow::as_select())
        .order(rescuers::rescuer_id.asc())
        .load(conn)?;
    rows.into_iter().map(RescuerRow::into_rescuer).collect()
}
}

backend_fn! {
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded.
pub fn load_patient(conn: &mut _, patient_id: i64) -> Result<Option<Patient>, PersistenceError> {
    patients::table
        .find(patient_id)
        .select(PatientRow::as_select())
        .first(conn)
        .optional()?
        .map(PatientRow::into_patient)
        .transpose()
}
}

backend_fn! {
/// Lists patients, most recently created first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_patients(conn: &mut _, limit: i64) -> Result<Vec<Patient>, PersistenceError> {
    let rows: Vec<PatientRow> = patients::table
        .select(PatientRow::as_select())
        .order((patients::created_at.desc(), patients::patient_id.desc()))
        .limit(limit)
        .load(conn)?;
    rows.into_iter().map(PatientRow::into_patient).collect()
}
}
