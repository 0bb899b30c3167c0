// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;

/// Maximum accepted length of a call-session identifier.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Default number of records returned by recent-listing queries.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Maximum number of records a listing query may request.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Validates a call-session identifier.
///
/// # Arguments
///
/// * `session_id` - The identifier supplied by the telephony or extraction side
///
/// # Errors
///
/// Returns an error if the identifier:
/// - is empty
/// - is longer than `MAX_SESSION_ID_LEN` bytes
/// - contains whitespace or control characters
pub fn validate_session_id(session_id: &str) -> Result<(), DomainError> {
    if session_id.is_empty() {
        return Err(DomainError::InvalidSessionId(String::from(
            "must not be empty",
        )));
    }
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(DomainError::InvalidSessionId(format!(
            "must be at most {MAX_SESSION_ID_LEN} bytes"
        )));
    }
    if session_id
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(DomainError::InvalidSessionId(String::from(
            "must not contain whitespace or control characters",
        )));
    }
    Ok(())
}

/// Validates that an identifier is a positive integer.
///
/// # Errors
///
/// Returns `DomainError::InvalidId` if `id` is zero or negative.
pub const fn validate_id(entity: &'static str, id: i64) -> Result<(), DomainError> {
    if id <= 0 {
        return Err(DomainError::InvalidId { entity, id });
    }
    Ok(())
}

/// Validates that a name field is not blank.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the value is empty after trimming.
pub fn validate_name(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidName { field });
    }
    Ok(())
}

/// Validates a latitude/longitude pair.
///
/// # Errors
///
/// Returns `DomainError::InvalidCoordinates` if either value is not finite
/// or is outside its range.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), DomainError> {
    let valid: bool = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if !valid {
        return Err(DomainError::InvalidCoordinates {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        });
    }
    Ok(())
}

/// Resolves an optional listing limit against the default and maximum.
///
/// # Errors
///
/// Returns `DomainError::InvalidLimit` if the limit is not in `1..=MAX_LIST_LIMIT`.
pub const fn resolve_limit(limit: Option<i64>) -> Result<i64, DomainError> {
    match limit {
        None => Ok(DEFAULT_LIST_LIMIT),
        Some(limit) if limit >= 1 && limit <= MAX_LIST_LIMIT => Ok(limit),
        Some(limit) => Err(DomainError::InvalidLimit {
            limit,
            max: MAX_LIST_LIMIT,
        }),
    }
}
