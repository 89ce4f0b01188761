//! Lenient timestamp parsing.
//!
//! Published timestamps arrive as whatever string the authoring client wrote.
//! Pagination sorts on them, so parsing must never fail: anything we cannot
//! understand is `None`, which sorts last.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a `published`-style timestamp string.
///
/// Accepts RFC 3339 (with offset), a bare `YYYY-MM-DDTHH:MM:SS` (assumed
/// UTC, `T` or space separator), or a bare date. Returns `None` for anything
/// else rather than erroring.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-03-01T12:30:00-05:00").unwrap();
        assert_eq!(dt.hour(), 17);
    }

    #[test]
    fn test_naive_assumed_utc() {
        let dt = parse_timestamp("2024-03-01T12:30:00").unwrap();
        assert_eq!(dt.hour(), 12);
        assert!(parse_timestamp("2024-03-01 12:30:00").is_some());
    }

    #[test]
    fn test_bare_date() {
        let dt = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-99").is_none());
    }
}
