// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rescue_dispatch_domain::{NewDispatcher, RescuerLocation};

use crate::{
    ActivePointerResponse, ApiError, ConfirmEmergencyResponse, ServerTimeResponse,
    UpdateActivePointerRequest, clear_all, create_dispatcher, current_time_millis,
    get_active_pointer, list_dispatchers, list_patients, server_time, update_active_pointer,
    update_rescuer_location,
};

use super::helpers::{T0, TestContext, create_confirmed_incident, create_test_context};

#[test]
fn test_server_time_formats_rfc3339() {
    let response: ServerTimeResponse = server_time(T0).unwrap();
    assert_eq!(response.now, T0);
    assert_eq!(response.iso, "2026-03-01T00:00:00Z");
}

#[test]
fn test_current_time_is_after_2026() {
    assert!(current_time_millis() > T0 - 365 * 24 * 3_600_000);
}

#[test]
fn test_pointer_round_trip() {
    let mut ctx: TestContext = create_test_context();
    let confirmed: ConfirmEmergencyResponse = create_confirmed_incident(&mut ctx, "CA-700");

    let empty: ActivePointerResponse = get_active_pointer(&mut ctx.persistence, "global").unwrap();
    assert_eq!(empty.active_incident_id, None);

    let set: ActivePointerResponse = update_active_pointer(
        &mut ctx.persistence,
        "global",
        UpdateActivePointerRequest {
            active_dispatcher_id: Some(ctx.dispatcher_id),
            active_incident_id: Some(Some(confirmed.incident.incident_id)),
        },
        T0 + 5,
    )
    .unwrap();
    assert_eq!(set.active_incident_id, Some(confirmed.incident.incident_id));
    assert_eq!(
        get_active_pointer(&mut ctx.persistence, "global").unwrap(),
        set
    );

    let unknown: ApiError = update_active_pointer(
        &mut ctx.persistence,
        "global",
        UpdateActivePointerRequest {
            active_dispatcher_id: None,
            active_incident_id: Some(Some(4040)),
        },
        T0 + 6,
    )
    .unwrap_err();
    assert!(matches!(unknown, ApiError::ResourceNotFound { .. }));
}

#[test]
fn test_reference_validation_precedes_storage() {
    let mut ctx: TestContext = create_test_context();
    let blank: ApiError = create_dispatcher(
        &mut ctx.persistence,
        &NewDispatcher {
            name: String::new(),
            phone: None,
        },
        T0,
    )
    .unwrap_err();
    assert!(matches!(blank, ApiError::InvalidInput { .. }));

    let off_map: ApiError = update_rescuer_location(
        &mut ctx.persistence,
        ctx.rescuer_id,
        RescuerLocation {
            latitude: -33.4,
            longitude: 200.0,
        },
        T0,
    )
    .unwrap_err();
    assert!(matches!(off_map, ApiError::InvalidInput { ref field, .. } if field == "coordinates"));

    let bad_limit: ApiError = list_patients(&mut ctx.persistence, Some(501)).unwrap_err();
    assert!(matches!(bad_limit, ApiError::InvalidInput { .. }));
}

#[test]
fn test_clear_all_removes_reference_data() {
    let mut ctx: TestContext = create_test_context();
    create_confirmed_incident(&mut ctx, "CA-710");
    clear_all(&mut ctx.persistence).unwrap();
    assert!(
        list_dispatchers(&mut ctx.persistence)
            .unwrap()
            .dispatchers
            .is_empty()
    );
}
