//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Rows written by this crate always carry RFC3339 text, so the fallback only
/// triggers for rows edited by hand.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a nullable datetime column
///
/// `NULL` and unparseable values both map to `None`; a user who has never
/// logged in has no last-login timestamp.
pub fn parse_optional_datetime(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
