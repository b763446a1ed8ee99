//! Type-safe request identifier.
//!
//! [`RequestId`] is a newtype wrapper around the server-assigned identifier
//! string so that request identifiers cannot be confused with other strings
//! (names, titles, notes) flowing through the same code.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, server-assigned identifier of a song request.
///
/// Stable for the lifetime of the request. Used as the reconciliation key in
/// [`super::RequestCollection`] and as the path segment of admin commands.
///
/// The server issues MongoDB ObjectIds, whose first four bytes encode the
/// creation time; [`RequestId::embedded_timestamp_ms`] exposes that as an
/// ordering fallback without assuming every identifier has that shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Wraps an identifier string received from the server.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the creation time embedded in an ObjectId-shaped identifier,
    /// in milliseconds since the Unix epoch.
    ///
    /// Reads the first eight characters as hexadecimal seconds. Returns
    /// `None` when the identifier is shorter than that or not hexadecimal.
    #[must_use]
    pub fn embedded_timestamp_ms(&self) -> Option<i64> {
        let prefix = self.0.get(..8)?;
        let secs = u32::from_str_radix(prefix, 16).ok()?;
        Some(i64::from(secs) * 1000)
    }

    /// Picks the identifier of a server document that may carry `_id`,
    /// `id`, or both. A non-empty `_id` wins.
    pub(crate) fn from_keys(
        primary: Option<Self>,
        secondary: Option<Self>,
    ) -> Result<Self, String> {
        primary
            .filter(|id| !id.0.is_empty())
            .or_else(|| secondary.filter(|id| !id.0.is_empty()))
            .ok_or_else(|| "missing field `_id`".to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn object_id_prefix_decodes_to_millis() {
        // 0x65a1b2c3 = 1705095875 seconds
        let id = RequestId::new("65a1b2c3d4e5f60718293a4b");
        assert_eq!(id.embedded_timestamp_ms(), Some(1_705_095_875_000));
    }

    #[test]
    fn short_id_has_no_timestamp() {
        assert_eq!(RequestId::new("abc").embedded_timestamp_ms(), None);
        assert_eq!(RequestId::new("").embedded_timestamp_ms(), None);
    }

    #[test]
    fn non_hex_id_has_no_timestamp() {
        let id = RequestId::new("req-0001-not-an-object-id");
        assert_eq!(id.embedded_timestamp_ms(), None);
    }

    #[test]
    fn multibyte_prefix_does_not_panic() {
        let id = RequestId::new("ñandú-canción");
        assert_eq!(id.embedded_timestamp_ms(), None);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = RequestId::new("65a1b2c3d4e5f60718293a4b");
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"65a1b2c3d4e5f60718293a4b\"");
    }

    #[test]
    fn underscore_id_wins_over_plain_id() {
        let picked = RequestId::from_keys(Some(RequestId::new("a")), Some(RequestId::new("b")));
        assert_eq!(picked, Ok(RequestId::new("a")));
        let picked = RequestId::from_keys(Some(RequestId::new("")), Some(RequestId::new("b")));
        assert_eq!(picked, Ok(RequestId::new("b")));
        assert!(RequestId::from_keys(None, None).is_err());
    }

    #[test]
    fn display_is_raw_id() {
        let id = RequestId::from("abc123");
        assert_eq!(format!("{id}"), "abc123");
    }
}
