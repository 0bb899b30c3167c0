// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Incident lifecycle and assignment orchestration rules.
//!
//! Every function here is pure: it takes the records as currently stored
//! plus the current time and returns what should be written. Atomicity is
//! the persistence layer's job.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod arbitration;
mod error;
mod lifecycle;
mod transcript;
mod upsert;

#[cfg(test)]
mod tests;

pub use arbitration::{
    AssignmentEvent, OfferDecision, RejectPolicy, apply_assignment_event, current_assignment,
    decide_offer, new_offer, pending_offers,
};
pub use error::CoreError;
pub use lifecycle::{IncidentEvent, Transition, apply_incident_event};
pub use transcript::{full_text, insert_chunk, sort_chunks};
pub use upsert::{UpsertOutcome, new_incident, next_stamp, plan_upsert, validate_upsert};
