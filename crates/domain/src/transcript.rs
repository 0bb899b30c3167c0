// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Call transcript types.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Text of the system chunk seeded when a call starts.
pub const INCOMING_CALL_NOTICE: &str = "Incoming call...";

/// Who produced a transcript fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Caller,
    Dispatcher,
    System,
}

impl Speaker {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Caller => "caller",
            Self::Dispatcher => "dispatcher",
            Self::System => "system",
        }
    }
}

impl FromStr for Speaker {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "caller" => Ok(Self::Caller),
            "dispatcher" => Ok(Self::Dispatcher),
            "system" => Ok(Self::System),
            _ => Err(DomainError::InvalidStatus {
                kind: "speaker",
                value: s.to_string(),
            }),
        }
    }
}

/// One speech fragment, positioned by seconds from call start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub offset: f64,
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptChunk {
    #[must_use]
    pub fn new(offset: f64, speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            offset,
            speaker,
            text: text.into(),
        }
    }

    /// Validates the chunk offset.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidChunkOffset` if the offset is negative,
    /// `NaN`, or infinite.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.offset.is_finite() || self.offset < 0.0 {
            return Err(DomainError::InvalidChunkOffset(self.offset.to_string()));
        }
        Ok(())
    }
}

/// The call record attached to an incident.
///
/// `chunks` is always sorted by offset and `transcription` is always the
/// space-joined text of `chunks` in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: i64,
    pub incident_id: i64,
    pub caller_phone: Option<String>,
    pub chunks: Vec<TranscriptChunk>,
    pub transcription: String,
    /// Incremented on every write; guards conditional updates.
    pub revision: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
