// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::ActivePointer;

use crate::data_models::PointerRow;
use crate::diesel_schema::active_pointer;
use crate::error::PersistenceError;

backend_fn! {
/// Loads the active pointer for a scope.
///
/// Returns `Ok(None)` before the first write to the scope.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_pointer(conn: &mut _, scope: &str) -> Result<Option<ActivePointer>, PersistenceError> {
    let row: Option<PointerRow> = active_pointer::table
        .find(scope)
        .select(PointerRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(ActivePointer::from))
}
}
