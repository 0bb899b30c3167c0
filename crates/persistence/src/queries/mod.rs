// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! ## Module Organization
//!
//! - `incidents`: Incident lookups by id, session and status
//! - `calls`: Call transcript lookups
//! - `assignments`: Assignment lookups by id, incident, rescuer and status
//! - `pointer`: Active-pointer lookups
//! - `profiles`: Dispatcher, rescuer and patient lookups
//!
//! ## Backend-Specific Functions
//!
//! All query functions are generated in backend-specific monomorphic versions:
//! - Functions suffixed with `_sqlite` for `SQLite`
//! - Functions suffixed with `_mysql` for `MySQL`/`MariaDB`
//!
//! They are reached through the `RecordStore` trait, never called directly
//! by the `Persistence` adapter.

pub mod assignments;
pub mod calls;
pub mod incidents;
pub mod pointer;
pub mod profiles;
