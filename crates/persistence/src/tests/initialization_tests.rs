// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Every other test module opens its database through
//! `Persistence::new_in_memory()`, which already exercises connection
//! setup, migrations and foreign key verification. These tests cover the
//! remaining entry points.

use crate::{Persistence, PersistenceError};

use super::{T0, seed_profiles};

#[test]
fn test_persistence_initialization() {
    let result: Result<Persistence, PersistenceError> = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_keys_enforced_after_initialization() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1: Persistence = Persistence::new_in_memory().unwrap();
    let mut db2: Persistence = Persistence::new_in_memory().unwrap();

    seed_profiles(&mut db1);

    assert_eq!(db1.list_dispatchers().unwrap().len(), 1);
    assert!(
        db2.list_dispatchers().unwrap().is_empty(),
        "db2 must not see db1's dispatcher"
    );
}

#[test]
fn test_file_database_persists_across_reopen() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let path: std::path::PathBuf = dir.path().join("dispatch.db");

    let dispatcher_id: i64 = {
        let mut persistence: Persistence = Persistence::new_with_file(&path).unwrap();
        seed_profiles(&mut persistence).0
    };

    let mut reopened: Persistence = Persistence::new_with_file(&path).unwrap();
    let dispatcher = reopened.get_dispatcher(dispatcher_id).unwrap();
    assert_eq!(dispatcher.name, "Ana Torres");
    assert_eq!(dispatcher.created_at, T0);
}
