// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend validation tests for MariaDB/MySQL.
//!
//! These tests check schema and transaction compatibility, not dispatch
//! rules. Dispatch rules are covered by the `SQLite` suite.
//!
//! They are marked `#[ignore]` and run only via `cargo xtask test-mariadb`,
//! which provisions the database and exports:
//! - `DATABASE_URL`
//! - `RESCUE_DISPATCH_TEST_BACKEND=mariadb`
//!
//! Tests fail fast if that infrastructure is missing. The database is shared
//! between tests, so every test uses its own session ids and names.

use diesel::MysqlConnection;
use diesel::prelude::*;
use diesel::result::ConnectionError;
use rescue_dispatch::RejectPolicy;
use rescue_dispatch_domain::{AssignmentStatus, IncidentPatch, NewDispatcher, NewRescuer};
use std::env;

use crate::backend::mysql;
use crate::{ClaimOutcome, ConfirmOutcome, Persistence, PersistenceError};

use super::T0;

fn get_mariadb_url() -> String {
    env::var("DATABASE_URL").expect(
        "DATABASE_URL not set - MariaDB tests must be run via `cargo xtask test-mariadb`",
    )
}

fn verify_mariadb_test_environment() {
    let backend: String = env::var("RESCUE_DISPATCH_TEST_BACKEND").expect(
        "RESCUE_DISPATCH_TEST_BACKEND not set - MariaDB tests must be run via `cargo xtask test-mariadb`",
    );
    assert_eq!(
        backend, "mariadb",
        "RESCUE_DISPATCH_TEST_BACKEND must be 'mariadb'"
    );
}

fn unique_suffix(label: &str) -> String {
    format!("{label}-{}-{}", std::process::id(), T0)
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_connection() {
    verify_mariadb_test_environment();
    let result: Result<MysqlConnection, ConnectionError> =
        MysqlConnection::establish(&get_mariadb_url());
    assert!(result.is_ok(), "Failed to connect to MariaDB: {:?}", result.err());
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_migrations_apply_cleanly() {
    verify_mariadb_test_environment();
    let result: Result<MysqlConnection, PersistenceError> =
        mysql::initialize_database(&get_mariadb_url());
    assert!(
        result.is_ok(),
        "Failed to initialize MariaDB and run migrations: {:?}",
        result.err()
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_foreign_key_enforcement() {
    verify_mariadb_test_environment();
    let mut conn: MysqlConnection = mysql::initialize_database(&get_mariadb_url())
        .expect("Failed to initialize MariaDB database");

    mysql::verify_foreign_key_enforcement(&mut conn).expect("foreign_key_checks is off");

    let orphan = diesel::sql_query(
        "INSERT INTO incidents (call_session_id, status, priority, dispatcher_id, created_at, last_updated)
         VALUES ('fk-orphan', 'incoming_call', 'medium', 999999999, 0, 0)",
    )
    .execute(&mut conn);
    assert!(
        orphan.is_err(),
        "Incident with unknown dispatcher should fail due to foreign key constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_session_id_is_unique() {
    verify_mariadb_test_environment();
    let mut conn: MysqlConnection = mysql::initialize_database(&get_mariadb_url())
        .expect("Failed to initialize MariaDB database");

    diesel::sql_query("INSERT INTO dispatchers (name, created_at) VALUES ('Unique Check', 0)")
        .execute(&mut conn)
        .expect("Failed to insert dispatcher");
    let dispatcher_id: i64 =
        mysql::get_last_insert_rowid(&mut conn).expect("Failed to read LAST_INSERT_ID");

    let session: String = unique_suffix("unique");
    let insert = format!(
        "INSERT INTO incidents (call_session_id, status, priority, dispatcher_id, created_at, last_updated)
         VALUES ('{session}', 'incoming_call', 'medium', {dispatcher_id}, 0, 0)"
    );
    diesel::sql_query(&insert)
        .execute(&mut conn)
        .expect("First incident insert failed");

    let duplicate = diesel::sql_query(&insert).execute(&mut conn);
    assert!(
        duplicate.is_err(),
        "Duplicate call_session_id should fail due to UNIQUE constraint"
    );
}

#[test]
#[ignore = "requires MariaDB via cargo xtask test-mariadb"]
fn test_mariadb_full_claim() {
    verify_mariadb_test_environment();
    let mut persistence: Persistence =
        Persistence::new_with_mysql(&get_mariadb_url()).expect("Failed to open MariaDB");

    let dispatcher_id: i64 = persistence
        .create_dispatcher(
            &NewDispatcher {
                name: String::from("MariaDB Dispatcher"),
                phone: None,
            },
            T0,
        )
        .unwrap()
        .dispatcher_id;
    let rescuer_id: i64 = persistence
        .create_rescuer(
            &NewRescuer {
                name: String::from("MariaDB Unit"),
                phone: None,
            },
            T0,
        )
        .unwrap()
        .rescuer_id;

    let session: String = unique_suffix("claim");
    let incident_id: i64 = persistence
        .upsert_incident(&session, dispatcher_id, &IncidentPatch::default(), T0)
        .unwrap()
        .incident()
        .incident_id;
    persistence
        .apply_incident_event(
            incident_id,
            rescue_dispatch::IncidentEvent::AcceptCall { dispatcher_id },
            T0 + 1,
        )
        .unwrap();

    let confirmed: ConfirmOutcome = persistence.confirm_emergency(incident_id, T0 + 2).unwrap();
    let assignment_id: i64 = confirmed.offer.assignment.assignment_id;

    let claim: ClaimOutcome = persistence
        .accept_assignment(assignment_id, rescuer_id, T0 + 3)
        .unwrap();
    assert_eq!(claim.assignment.status, AssignmentStatus::Accepted);

    let again: PersistenceError = persistence
        .accept_assignment(assignment_id, rescuer_id, T0 + 4)
        .unwrap_err();
    assert!(matches!(
        again,
        PersistenceError::Engine(rescue_dispatch::CoreError::AlreadyClaimed { .. })
    ));

    // Rejecting a claimed offer leaves it untouched.
    assert!(
        persistence
            .reject_assignment(assignment_id, RejectPolicy::AwaitDispatcher, T0 + 5)
            .is_err()
    );
    persistence.delete_incident(incident_id).unwrap();
}
