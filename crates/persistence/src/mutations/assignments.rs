// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::{Assignment, AssignmentStatus};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::incident_assignments;
use crate::error::PersistenceError;

backend_fn! {
/// Inserts a new assignment.
///
/// # Returns
///
/// The assignment as stored, with `assignment_id` set.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_assignment(
    conn: &mut _,
    assignment: &Assignment,
) -> Result<Assignment, PersistenceError> {
    diesel::insert_into(incident_assignments::table)
        .values((
            incident_assignments::incident_id.eq(assignment.incident_id),
            incident_assignments::rescuer_id.eq(assignment.rescuer_id),
            incident_assignments::status.eq(assignment.status.as_str()),
            incident_assignments::offered_at.eq(assignment.times.offered),
            incident_assignments::responded_at.eq(assignment.times.responded),
            incident_assignments::accepted_at.eq(assignment.times.accepted),
            incident_assignments::completed_at.eq(assignment.times.completed),
        ))
        .execute(conn)?;

    let assignment_id: i64 = conn.get_last_insert_rowid()?;
    info!(
        assignment_id,
        incident_id = assignment.incident_id,
        "Offered assignment"
    );

    let mut stored: Assignment = assignment.clone();
    stored.assignment_id = assignment_id;
    Ok(stored)
}
}

backend_fn! {
/// Writes an assignment's new state, provided its stored status is still
/// `expected`.
///
/// This is the compare-and-set that arbitrates concurrent claims: of any
/// number of callers that read the same `pending` row, exactly one update
/// matches it.
///
/// # Returns
///
/// `true` if the row was updated, `false` if its status had moved on.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_assignment(
    conn: &mut _,
    assignment: &Assignment,
    expected: AssignmentStatus,
) -> Result<bool, PersistenceError> {
    let rows: usize = diesel::update(
        incident_assignments::table
            .find(assignment.assignment_id)
            .filter(incident_assignments::status.eq(expected.as_str())),
    )
    .set((
        incident_assignments::rescuer_id.eq(assignment.rescuer_id),
        incident_assignments::status.eq(assignment.status.as_str()),
        incident_assignments::responded_at.eq(assignment.times.responded),
        incident_assignments::accepted_at.eq(assignment.times.accepted),
        incident_assignments::completed_at.eq(assignment.times.completed),
    ))
    .execute(conn)?;

    debug!(
        assignment_id = assignment.assignment_id,
        from = %expected,
        to = %assignment.status,
        applied = rows > 0,
        "Conditional assignment update"
    );
    Ok(rows > 0)
}
}
