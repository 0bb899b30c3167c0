// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use rescue_dispatch_domain::ActivePointer;

use crate::diesel_schema::active_pointer;
use crate::error::PersistenceError;

backend_fn! {
/// Stores the pointer row for its scope, creating it on first write.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn save_pointer(conn: &mut _, pointer: &ActivePointer) -> Result<(), PersistenceError> {
    let rows: usize = diesel::update(active_pointer::table.find(&pointer.scope))
        .set((
            active_pointer::active_dispatcher_id.eq(pointer.active_dispatcher_id),
            active_pointer::active_incident_id.eq(pointer.active_incident_id),
            active_pointer::updated_at.eq(pointer.updated_at),
        ))
        .execute(conn)?;

    if rows == 0 {
        diesel::insert_into(active_pointer::table)
            .values((
                active_pointer::pointer_key.eq(&pointer.scope),
                active_pointer::active_dispatcher_id.eq(pointer.active_dispatcher_id),
                active_pointer::active_incident_id.eq(pointer.active_incident_id),
                active_pointer::updated_at.eq(pointer.updated_at),
            ))
            .execute(conn)?;
    }
    Ok(())
}
}
