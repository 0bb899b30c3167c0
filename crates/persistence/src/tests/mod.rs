// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

#[cfg(feature = "mysql")]
mod backend_validation_tests;
mod initialization_tests;
mod lifecycle_tests;

use rescue_dispatch::{CoreError, IncidentEvent};
use rescue_dispatch_domain::{Incident, IncidentPatch, NewDispatcher, NewRescuer};

use crate::{BackendConnection, Persistence, PersistenceError};
use diesel::SqliteConnection;

/// 2026-03-01T00:00:00Z in epoch milliseconds.
pub const T0: i64 = 1_772_323_200_000;

/// A fresh database holding one dispatcher and one rescuer.
pub struct Fixture {
    pub persistence: Persistence,
    pub dispatcher_id: i64,
    pub rescuer_id: i64,
}

pub fn create_fixture() -> Fixture {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (dispatcher_id, rescuer_id) = seed_profiles(&mut persistence);
    Fixture {
        persistence,
        dispatcher_id,
        rescuer_id,
    }
}

pub fn seed_profiles(persistence: &mut Persistence) -> (i64, i64) {
    let dispatcher_id: i64 = persistence
        .create_dispatcher(
            &NewDispatcher {
                name: String::from("Ana Torres"),
                phone: None,
            },
            T0,
        )
        .unwrap()
        .dispatcher_id;
    let rescuer_id: i64 = create_rescuer(persistence, "Unit 7");
    (dispatcher_id, rescuer_id)
}

pub fn create_rescuer(persistence: &mut Persistence, name: &str) -> i64 {
    persistence
        .create_rescuer(
            &NewRescuer {
                name: name.to_string(),
                phone: Some(String::from("+56 9 1234 5678")),
            },
            T0,
        )
        .unwrap()
        .rescuer_id
}

/// Upserts an incident for `session` with no extracted fields.
pub fn create_incident(fixture: &mut Fixture, session: &str) -> Incident {
    fixture
        .persistence
        .upsert_incident(session, fixture.dispatcher_id, &IncidentPatch::default(), T0)
        .unwrap()
        .incident()
        .clone()
}

/// Upserts an incident for `session` and has the fixture dispatcher accept it.
pub fn create_confirmed_incident(fixture: &mut Fixture, session: &str) -> Incident {
    let incident: Incident = create_incident(fixture, session);
    fixture
        .persistence
        .apply_incident_event(
            incident.incident_id,
            IncidentEvent::AcceptCall {
                dispatcher_id: fixture.dispatcher_id,
            },
            T0 + 10,
        )
        .unwrap()
        .incident
}

pub fn is_not_found(err: &PersistenceError, expected: &str) -> bool {
    matches!(err, PersistenceError::Engine(CoreError::NotFound { resource, .. }) if *resource == expected)
}

/// The raw connection behind a test adapter, for driving the record
/// primitives directly.
pub fn sqlite_conn(persistence: &mut Persistence) -> &mut SqliteConnection {
    match &mut persistence.conn {
        BackendConnection::Sqlite(conn) => conn,
        #[cfg(feature = "mysql")]
        BackendConnection::Mysql(_) => panic!("Unit tests run against SQLite"),
    }
}
