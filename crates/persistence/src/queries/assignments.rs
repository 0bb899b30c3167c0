// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::{Assignment, AssignmentStatus};

use crate::data_models::AssignmentRow;
use crate::diesel_schema::incident_assignments;
use crate::error::PersistenceError;

fn decode(rows: Vec<AssignmentRow>) -> Result<Vec<Assignment>, PersistenceError> {
    rows.into_iter().map(AssignmentRow::into_assignment).collect()
}

backend_fn! {
/// Loads an assignment by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be decoded.
pub fn load_assignment(
    conn: &mut _,
    assignment_id: i64,
) -> Result<Option<Assignment>, PersistenceError> {
    incident_assignments::table
        .find(assignment_id)
        .select(AssignmentRow::as_select())
        .first(conn)
        .optional()?
        .map(AssignmentRow::into_assignment)
        .transpose()
}
}

backend_fn! {
/// Lists every assignment of an incident, oldest offer first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_assignments_for_incident(
    conn: &mut _,
    incident_id: i64,
) -> Result<Vec<Assignment>, PersistenceError> {
    let rows: Vec<AssignmentRow> = incident_assignments::table
        .filter(incident_assignments::incident_id.eq(incident_id))
        .select(AssignmentRow::as_select())
        .order((
            incident_assignments::offered_at.asc(),
            incident_assignments::assignment_id.asc(),
        ))
        .load(conn)?;
    decode(rows)
}
}

backend_fn! {
/// Lists the assignments a rescuer has claimed, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_assignments_for_rescuer(
    conn: &mut _,
    rescuer_id: i64,
) -> Result<Vec<Assignment>, PersistenceError> {
    let rows: Vec<AssignmentRow> = incident_assignments::table
        .filter(incident_assignments::rescuer_id.eq(rescuer_id))
        .select(AssignmentRow::as_select())
        .order((
            incident_assignments::offered_at.desc(),
            incident_assignments::assignment_id.desc(),
        ))
        .load(conn)?;
    decode(rows)
}
}

backend_fn! {
/// Lists assignments, optionally restricted to one status through the
/// `by_status` index, oldest offer first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_assignments(
    conn: &mut _,
    status: Option<AssignmentStatus>,
) -> Result<Vec<Assignment>, PersistenceError> {
    let mut query = incident_assignments::table
        .select(AssignmentRow::as_select())
        .order((
            incident_assignments::offered_at.asc(),
            incident_assignments::assignment_id.asc(),
        ))
        .into_boxed();

    if let Some(status) = status {
        query = query.filter(incident_assignments::status.eq(status.as_str()));
    }

    let rows: Vec<AssignmentRow> = query.load(conn)?;
    decode(rows)
}
}
