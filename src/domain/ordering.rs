//! Ordering keys for the queue view.
//!
//! Push events may omit timestamp fields, and older documents may carry
//! values that do not parse. Every request still needs a deterministic sort
//! key, so each key walks a fallback chain and bottoms out at `0` instead of
//! failing:
//!
//! | Field                   | Chain                                        |
//! |-------------------------|----------------------------------------------|
//! | [`OrderField::Created`] | `createdAt` → identifier timestamp → `0`     |
//! | [`OrderField::Updated`] | `updatedAt` → `createdAt` → identifier → `0` |
//!
//! All keys are milliseconds since the Unix epoch.

use chrono::{DateTime, NaiveDateTime};

use super::SongRequest;

/// Which timestamp a sort key is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    /// Creation time; used for FIFO ordering of live buckets.
    Created,
    /// Last status change; used for recency ordering of finished requests.
    Updated,
}

/// Returns the sort key of `request` for `field`, in epoch milliseconds.
#[must_use]
pub fn order_key(request: &SongRequest, field: OrderField) -> i64 {
    let created = || parse_timestamp_ms(request.created_at.as_deref());
    let from_id = || request.id.embedded_timestamp_ms();

    let key = match field {
        OrderField::Created => created().or_else(from_id),
        OrderField::Updated => parse_timestamp_ms(request.updated_at.as_deref())
            .or_else(created)
            .or_else(from_id),
    };
    key.unwrap_or(0)
}

/// Parses a wire timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 (`2024-01-12T21:44:35.123Z`, with or without fraction
/// or offset) and a bare `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC. Anything
/// else, including blank strings, yields `None`.
#[must_use]
pub fn parse_timestamp_ms(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    // 0x65a1b2c3 seconds
    const OID: &str = "65a1b2c3d4e5f60718293a4b";
    const OID_MS: i64 = 1_705_095_875_000;

    fn request(id: &str, created: Option<&str>, updated: Option<&str>) -> SongRequest {
        let mut req = SongRequest::new(id, "Ana", "Abba", "Waterloo");
        req.created_at = created.map(str::to_string);
        req.updated_at = updated.map(str::to_string);
        req
    }

    #[test]
    fn parses_rfc3339_with_millis() {
        assert_eq!(
            parse_timestamp_ms(Some("1970-01-01T00:00:01.500Z")),
            Some(1_500)
        );
    }

    #[test]
    fn parses_offset_and_naive_forms() {
        assert_eq!(
            parse_timestamp_ms(Some("1970-01-01T01:00:00+01:00")),
            Some(0)
        );
        assert_eq!(parse_timestamp_ms(Some("1970-01-01T00:00:02")), Some(2_000));
    }

    #[test]
    fn garbage_and_blank_do_not_parse() {
        assert_eq!(parse_timestamp_ms(None), None);
        assert_eq!(parse_timestamp_ms(Some("")), None);
        assert_eq!(parse_timestamp_ms(Some("  ")), None);
        assert_eq!(parse_timestamp_ms(Some("yesterday")), None);
    }

    #[test]
    fn created_key_prefers_created_at() {
        let req = request(OID, Some("1970-01-01T00:00:05Z"), None);
        assert_eq!(order_key(&req, OrderField::Created), 5_000);
    }

    #[test]
    fn created_key_falls_back_to_identifier() {
        let req = request(OID, Some("not a date"), None);
        assert_eq!(order_key(&req, OrderField::Created), OID_MS);
    }

    #[test]
    fn created_key_ignores_updated_at() {
        let req = request("r1", None, Some("1970-01-01T00:00:05Z"));
        assert_eq!(order_key(&req, OrderField::Created), 0);
    }

    #[test]
    fn updated_key_walks_full_chain() {
        let all = request(OID, Some("1970-01-01T00:00:05Z"), Some("1970-01-01T00:00:09Z"));
        assert_eq!(order_key(&all, OrderField::Updated), 9_000);

        let no_update = request(OID, Some("1970-01-01T00:00:05Z"), None);
        assert_eq!(order_key(&no_update, OrderField::Updated), 5_000);

        let id_only = request(OID, None, Some("bogus"));
        assert_eq!(order_key(&id_only, OrderField::Updated), OID_MS);

        let nothing = request("r1", None, None);
        assert_eq!(order_key(&nothing, OrderField::Updated), 0);
    }
}
