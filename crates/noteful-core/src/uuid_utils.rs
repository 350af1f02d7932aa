//! Identifier helpers.
//!
//! Every row id is a UUIDv7, so ids sort by creation time and a fresh id
//! never collides with fixture data. Ids arriving from clients are parsed
//! here so that "malformed" and "unknown" stay distinguishable.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Message for a path id that does not parse.
pub const INVALID_ID_MESSAGE: &str = "The `id` is not valid";

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use noteful_core::uuid_utils::new_v7;
///
/// let a = new_v7();
/// let b = new_v7();
/// assert_ne!(a, b);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Parse a path id, failing with a validation error on malformed input.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::Validation(INVALID_ID_MESSAGE.to_string()))
}

/// Parse an optional query-string id (`?folderId=`, `?tagId=`).
///
/// Absent or empty means "no filter".
pub fn parse_query_id(name: &str, raw: Option<&str>) -> Result<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| Error::Validation(format!("The `{}` is not valid", name))),
    }
}
