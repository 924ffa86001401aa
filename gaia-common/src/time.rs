//! Timestamp utilities
//!
//! Timestamps are persisted as fixed-width RFC 3339 text with microsecond
//! precision and a `Z` suffix, so lexical order in SQL equals chronological
//! order.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// Get current UTC timestamp, truncated to the stored precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for storage
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse_db_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", s, e)))
}

/// Midnight (UTC) at the start of the given calendar date
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// Inclusive lower bound of a trailing window: today's UTC midnight minus `days`
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    start_of_day(now.date_naive()) - chrono::Duration::days(i64::from(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
        assert_eq!(timestamp.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_db_timestamp_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        let text = to_db_timestamp(&ts);
        assert_eq!(text, "2026-03-14T15:09:26.000000Z");
        assert_eq!(parse_db_timestamp(&text).unwrap(), ts);
    }

    #[test]
    fn test_db_timestamp_lexical_order_matches_chronological() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(to_db_timestamp(&earlier) < to_db_timestamp(&later));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_db_timestamp("yesterday"), Err(Error::Internal(_))));
    }

    #[test]
    fn test_window_start_uses_day_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 18, 45, 0).unwrap();
        let start = window_start(now, 7);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 9, 0, 0, 0).unwrap());
    }
}
