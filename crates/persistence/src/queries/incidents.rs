// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::{Incident, IncidentStatus};
use tracing::debug;

use crate::data_models::IncidentRow;
use crate::diesel_schema::incidents;
use crate::error::PersistenceError;

backend_fn! {
/// Loads an incident by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded.
/// Returns `Ok(None)` if no incident has this id.
pub fn load_incident(conn: &mut _, incident_id: i64) -> Result<Option<Incident>, PersistenceError> {
    incidents::table
        .find(incident_id)
        .select(IncidentRow::as_select())
        .first(conn)
        .optional()?
        .map(IncidentRow::into_incident)
        .transpose()
}
}

backend_fn! {
/// Loads the incident for a call session through the `by_session` index.
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded.
pub fn find_incident_by_session(
    conn: &mut _,
    call_session_id: &str,
) -> Result<Option<Incident>, PersistenceError> {
    debug!(call_session_id, "Looking up incident by session");

    incidents::table
        .filter(incidents::call_session_id.eq(call_session_id))
        .select(IncidentRow::as_select())
        .first(conn)
        .optional()?
        .map(IncidentRow::into_incident)
        .transpose()
}
}

backend_fn! {
/// Lists incidents newest first.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `statuses` - Restrict to these statuses; empty means all
/// * `limit` - Maximum number of rows; `None` means no limit
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_incidents(
    conn: &mut _,
    statuses: &[IncidentStatus],
    limit: Option<i64>,
) -> Result<Vec<Incident>, PersistenceError> {
    let mut query = incidents::table
        .select(IncidentRow::as_select())
        .order((incidents::created_at.desc(), incidents::incident_id.desc()))
        .into_boxed();

    if !statuses.is_empty() {
        let wanted: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        query = query.filter(incidents::status.eq_any(wanted));
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    let rows: Vec<IncidentRow> = query.load(conn)?;
    rows.into_iter().map(IncidentRow::into_incident).collect()
}
}
