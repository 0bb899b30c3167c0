// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::CallRecord;

use crate::data_models::CallRow;
use crate::diesel_schema::calls;
use crate::error::PersistenceError;

backend_fn! {
/// Loads the call record of an incident through the `by_incident` index.
///
/// # Errors
///
/// Returns an error if the query fails or the stored chunks cannot be decoded.
pub fn load_call(conn: &mut _, incident_id: i64) -> Result<Option<CallRecord>, PersistenceError> {
    calls::table
        .filter(calls::incident_id.eq(incident_id))
        .select(CallRow::as_select())
        .first(conn)
        .optional()?
        .map(CallRow::into_call)
        .transpose()
}
}
