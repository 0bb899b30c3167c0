// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write primitives.
//!
//! ## Module Organization
//!
//! - `incidents`: Incident inserts and conditional updates, admin deletes
//! - `calls`: Call record inserts and revision-guarded updates
//! - `assignments`: Assignment inserts and status-guarded updates
//! - `pointer`: Active-pointer saves
//! - `profiles`: Dispatcher, rescuer and patient writes
//!
//! Every update that follows a read is conditional on the state that was
//! read. A conditional update that matches no row reports the loss to the
//! caller instead of overwriting a concurrent writer.
//!
//! None of these functions opens a transaction. Callers compose them inside
//! `PersistenceBackend::write_transaction`.

pub mod assignments;
pub mod calls;
pub mod incidents;
pub mod pointer;
pub mod profiles;
