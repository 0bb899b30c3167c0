// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// Pointer scope used when none is configured.
pub const DEFAULT_POINTER_SCOPE: &str = "global";

/// The incident and dispatcher currently on screen for one scope.
///
/// Advisory only; the last writer wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePointer {
    pub scope: String,
    pub active_dispatcher_id: Option<i64>,
    pub active_incident_id: Option<i64>,
    pub updated_at: i64,
}

impl ActivePointer {
    /// An unset pointer for `scope`, reported before the first write.
    #[must_use]
    pub fn empty(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            active_dispatcher_id: None,
            active_incident_id: None,
            updated_at: 0,
        }
    }
}

/// A change to the active pointer.
///
/// `None` leaves a field untouched. For the incident, `Some(None)` clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivePointerPatch {
    pub dispatcher_id: Option<i64>,
    pub incident_id: Option<Option<i64>>,
}

impl ActivePointerPatch {
    /// Applies the patch to `pointer`.
    pub const fn apply(&self, pointer: &mut ActivePointer) {
        if let Some(dispatcher_id) = self.dispatcher_id {
            pointer.active_dispatcher_id = Some(dispatcher_id);
        }
        if let Some(incident_id) = self.incident_id {
            pointer.active_incident_id = incident_id;
        }
    }
}
