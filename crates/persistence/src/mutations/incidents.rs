// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::{Incident, format_incident_number};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::IncidentFields;
use crate::diesel_schema::{
    active_pointer, calls, dispatchers, incident_assignments, incidents, patients, rescuers,
};
use crate::error::PersistenceError;

backend_fn! {
/// Inserts a new incident and assigns its incident number.
///
/// The number is derived from the generated key, so it is written by a
/// second statement in the same transaction as the insert.
///
/// # Returns
///
/// The incident as stored, with `incident_id` and `incident_number` set.
///
/// # Errors
///
/// Returns `WriteConflict` if another incident already holds the session id.
pub fn insert_incident(conn: &mut _, incident: &Incident) -> Result<Incident, PersistenceError> {
    let fields: IncidentFields = IncidentFields::from_incident(incident)?;

    diesel::insert_into(incidents::table)
        .values(&fields)
        .execute(conn)?;

    let incident_id: i64 = conn.get_last_insert_rowid()?;
    let incident_number: String = format_incident_number(incident_id, incident.created_at);

    diesel::update(incidents::table.find(incident_id))
        .set(incidents::incident_number.eq(&incident_number))
        .execute(conn)?;

    info!(
        incident_id,
        incident_number = %incident_number,
        call_session_id = %incident.call_session_id,
        "Created incident"
    );

    let mut stored: Incident = incident.clone();
    stored.incident_id = incident_id;
    stored.incident_number = incident_number;
    Ok(stored)
}
}

backend_fn! {
/// Overwrites an incident, provided it still carries the `last_updated`
/// stamp the caller read.
///
/// # Errors
///
/// Returns `WriteConflict` if the stored stamp no longer matches.
pub fn update_incident(
    conn: &mut _,
    incident: &Incident,
    observed_last_updated: i64,
) -> Result<(), PersistenceError> {
    let fields: IncidentFields = IncidentFields::from_incident(incident)?;

    let rows: usize = diesel::update(
        incidents::table
            .find(incident.incident_id)
            .filter(incidents::last_updated.eq(observed_last_updated)),
    )
    .set(&fields)
    .execute(conn)?;

    if rows == 0 {
        return Err(PersistenceError::WriteConflict(format!(
            "incident {} changed since it was read",
            incident.incident_id
        )));
    }

    debug!(
        incident_id = incident.incident_id,
        status = %incident.status,
        "Updated incident"
    );
    Ok(())
}
}

backend_fn! {
/// Advances an incident's `last_updated` stamp without touching any other
/// column, provided the stamp still matches `observed_last_updated`.
///
/// Offers take this row lock before inspecting assignments, so two offers
/// for one incident cannot both decide to create.
///
/// # Errors
///
/// Returns `WriteConflict` if the stored stamp no longer matches.
pub fn touch_incident(
    conn: &mut _,
    incident_id: i64,
    observed_last_updated: i64,
    stamp: i64,
) -> Result<(), PersistenceError> {
    let rows: usize = diesel::update(
        incidents::table
            .find(incident_id)
            .filter(incidents::last_updated.eq(observed_last_updated)),
    )
    .set(incidents::last_updated.eq(stamp))
    .execute(conn)?;

    if rows == 0 {
        return Err(PersistenceError::WriteConflict(format!(
            "incident {incident_id} changed since it was read"
        )));
    }
    Ok(())
}
}

backend_fn! {
/// Deletes an incident together with its call record and assignments.
///
/// # Returns
///
/// `true` if the incident existed.
///
/// # Errors
///
/// Returns an error if any delete fails.
pub fn delete_incident(conn: &mut _, incident_id: i64) -> Result<bool, PersistenceError> {
    diesel::update(active_pointer::table.filter(active_pointer::active_incident_id.eq(incident_id)))
        .set(active_pointer::active_incident_id.eq(None::<i64>))
        .execute(conn)?;
    diesel::delete(
        incident_assignments::table.filter(incident_assignments::incident_id.eq(incident_id)),
    )
    .execute(conn)?;
    diesel::delete(calls::table.filter(calls::incident_id.eq(incident_id))).execute(conn)?;
    let rows: usize = diesel::delete(incidents::table.find(incident_id)).execute(conn)?;

    if rows > 0 {
        info!(incident_id, "Deleted incident");
    }
    Ok(rows > 0)
}
}

backend_fn! {
/// Deletes every record in dependency order.
///
/// # Errors
///
/// Returns an error if any delete fails.
pub fn clear_all(conn: &mut _) -> Result<(), PersistenceError> {
    diesel::delete(active_pointer::table).execute(conn)?;
    diesel::delete(incident_assignments::table).execute(conn)?;
    diesel::delete(calls::table).execute(conn)?;
    diesel::delete(incidents::table).execute(conn)?;
    diesel::delete(patients::table).execute(conn)?;
    diesel::delete(rescuers::table).execute(conn)?;
    diesel::delete(dispatchers::table).execute(conn)?;

    info!("Cleared all records");
    Ok(())
}
}
