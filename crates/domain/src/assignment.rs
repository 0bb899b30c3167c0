// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Rescue assignment types.
//!
//! An assignment is offered to every rescuer at once and claimed by
//! exactly one of them.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Assignment lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Offered, unclaimed
    Pending,
    /// Claimed by a rescuer
    Accepted,
    /// Declined before anyone claimed it
    Rejected,
    /// Withdrawn before anyone claimed it
    Cancelled,
    /// Rescue finished
    Completed,
}

impl AssignmentStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Returns true if this assignment blocks a new offer for its incident.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

impl FromStr for AssignmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::InvalidStatus {
                kind: "assignment status",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamps of an assignment, epoch milliseconds. Each is set at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentTimes {
    pub offered: i64,
    pub responded: Option<i64>,
    pub accepted: Option<i64>,
    pub completed: Option<i64>,
}

/// A rescue offer for one incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: i64,
    pub incident_id: i64,
    /// Absent while pending; set exactly once, on acceptance.
    pub rescuer_id: Option<i64>,
    pub status: AssignmentStatus,
    pub times: AssignmentTimes,
}
