// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::new_incident;
use rescue_dispatch_domain::{Incident, IncidentPatch, IncidentStatus};

pub const T0: i64 = 1_772_323_200_000;

pub fn create_test_incident(status: IncidentStatus) -> Incident {
    let mut incident: Incident = new_incident("CA-test-1", 1, &IncidentPatch::default(), T0);
    incident.incident_id = 10;
    incident.incident_number = String::from("INC-2026-0010");
    incident.status = status;
    incident
}
