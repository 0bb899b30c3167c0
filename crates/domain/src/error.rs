// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
///
/// Every variant is raised before any store access takes place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The call-session identifier is empty or malformed.
    InvalidSessionId(String),
    /// An entity identifier is not a positive integer.
    InvalidId {
        /// The kind of entity the identifier refers to.
        entity: &'static str,
        /// The rejected identifier.
        id: i64,
    },
    /// A transcript chunk offset is negative or not finite.
    InvalidChunkOffset(String),
    /// A status string does not name a known status.
    InvalidStatus {
        /// The kind of status being parsed.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A required name field is empty.
    InvalidName {
        /// The field that failed validation.
        field: &'static str,
    },
    /// Latitude or longitude is out of range or not finite.
    InvalidCoordinates {
        /// The rejected latitude.
        latitude: String,
        /// The rejected longitude.
        longitude: String,
    },
    /// Only one of latitude and longitude was supplied.
    IncompleteCoordinates,
    /// Patient age is outside the accepted range.
    InvalidPatientAge(i32),
    /// A list limit is zero or exceeds the maximum.
    InvalidLimit {
        /// The rejected limit.
        limit: i64,
        /// The maximum accepted limit.
        max: i64,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSessionId(msg) => write!(f, "Invalid call session id: {msg}"),
            Self::InvalidId { entity, id } => {
                write!(f, "Invalid {entity} id: {id}. Must be a positive integer")
            }
            Self::InvalidChunkOffset(offset) => {
                write!(
                    f,
                    "Invalid transcript chunk offset: {offset}. Must be finite and non-negative"
                )
            }
            Self::InvalidStatus { kind, value } => write!(f, "Invalid {kind}: '{value}'"),
            Self::InvalidName { field } => write!(f, "Field '{field}' must not be empty"),
            Self::InvalidCoordinates {
                latitude,
                longitude,
            } => {
                write!(f, "Invalid coordinates: ({latitude}, {longitude})")
            }
            Self::IncompleteCoordinates => {
                write!(f, "Latitude and longitude must be supplied together")
            }
            Self::InvalidPatientAge(age) => {
                write!(f, "Invalid patient age: {age}. Must be between 0 and 150")
            }
            Self::InvalidLimit { limit, max } => {
                write!(f, "Invalid limit: {limit}. Must be between 1 and {max}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
