// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use rescue_dispatch_domain::{IncidentPatch, NewDispatcher, NewRescuer};
use rescue_dispatch_persistence::Persistence;

use crate::{
    AcceptCallRequest, ConfirmEmergencyResponse, UpsertIncidentRequest, UpsertIncidentResponse,
    accept_call, confirm_emergency, create_dispatcher, create_rescuer, upsert_incident,
};

/// 2026-03-01T00:00:00Z in epoch milliseconds.
pub const T0: i64 = 1_772_323_200_000;

pub struct TestContext {
    pub persistence: Persistence,
    pub dispatcher_id: i64,
    pub rescuer_id: i64,
}

pub fn create_test_context() -> TestContext {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let dispatcher_id: i64 = create_dispatcher(
        &mut persistence,
        &NewDispatcher {
            name: String::from("Camila Rojas"),
            phone: Some(String::from("+56 2 2000 0001")),
        },
        T0,
    )
    .unwrap()
    .dispatcher_id;
    let rescuer_id: i64 = create_rescuer(
        &mut persistence,
        &NewRescuer {
            name: String::from("SAMU 3"),
            phone: None,
        },
        T0,
    )
    .unwrap()
    .rescuer_id;

    TestContext {
        persistence,
        dispatcher_id,
        rescuer_id,
    }
}

pub fn create_upsert_request(
    ctx: &TestContext,
    session: &str,
    fields: IncidentPatch,
) -> UpsertIncidentRequest {
    UpsertIncidentRequest {
        call_session_id: session.to_string(),
        dispatcher_id: ctx.dispatcher_id,
        fields,
    }
}

/// Creates an incident and walks it to `confirmed` with an open offer.
pub fn create_confirmed_incident(ctx: &mut TestContext, session: &str) -> ConfirmEmergencyResponse {
    let request: UpsertIncidentRequest = create_upsert_request(ctx, session, IncidentPatch::default());
    let created: UpsertIncidentResponse =
        upsert_incident(&mut ctx.persistence, &request, T0).unwrap();
    accept_call(
        &mut ctx.persistence,
        created.incident_id,
        AcceptCallRequest {
            dispatcher_id: ctx.dispatcher_id,
        },
        T0 + 1,
    )
    .unwrap();
    confirm_emergency(&mut ctx.persistence, created.incident_id, T0 + 2).unwrap()
}
