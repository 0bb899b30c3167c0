// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::CallRecord;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::calls;
use crate::error::PersistenceError;

backend_fn! {
/// Inserts the call record of an incident.
///
/// # Returns
///
/// The record as stored, with `call_id` set.
///
/// # Errors
///
/// Returns `WriteConflict` if the incident already has a call record.
pub fn insert_call(conn: &mut _, call: &CallRecord) -> Result<CallRecord, PersistenceError> {
    let chunks_json: String = serde_json::to_string(&call.chunks)?;

    diesel::insert_into(calls::table)
        .values((
            calls::incident_id.eq(call.incident_id),
            calls::caller_phone.eq(&call.caller_phone),
            calls::chunks_json.eq(&chunks_json),
            calls::transcription.eq(&call.transcription),
            calls::revision.eq(call.revision),
            calls::created_at.eq(call.created_at),
            calls::updated_at.eq(call.updated_at),
        ))
        .execute(conn)?;

    let call_id: i64 = conn.get_last_insert_rowid()?;
    debug!(call_id, incident_id = call.incident_id, "Created call record");

    let mut stored: CallRecord = call.clone();
    stored.call_id = call_id;
    Ok(stored)
}
}

backend_fn! {
/// Overwrites a call record, provided it is still at `observed_revision`.
///
/// # Errors
///
/// Returns `WriteConflict` if another writer advanced the revision.
pub fn update_call(
    conn: &mut _,
    call: &CallRecord,
    observed_revision: i64,
) -> Result<(), PersistenceError> {
    let chunks_json: String = serde_json::to_string(&call.chunks)?;

    let rows: usize = diesel::update(
        calls::table
            .find(call.call_id)
            .filter(calls::revision.eq(observed_revision)),
    )
    .set((
        calls::caller_phone.eq(&call.caller_phone),
        calls::chunks_json.eq(&chunks_json),
        calls::transcription.eq(&call.transcription),
        calls::revision.eq(call.revision),
        calls::updated_at.eq(call.updated_at),
    ))
    .execute(conn)?;

    if rows == 0 {
        return Err(PersistenceError::WriteConflict(format!(
            "call {} changed since it was read",
            call.call_id
        )));
    }
    Ok(())
}
}
