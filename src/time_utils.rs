// SPDX-License-Identifier: MIT
// Copyright 2026 Coachtrack Contributors

//! Shared helpers for date/time handling.
//!
//! Program start dates and schedule queries arrive as plain `YYYY-MM-DD`
//! strings. Day arithmetic anchors both dates at noon UTC so calendar-day
//! offsets are immune to DST and timezone boundary drift.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC timestamp as RFC3339.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Today's date in UTC as a plain `YYYY-MM-DD` string.
pub fn today_utc_plain() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Parse a plain `YYYY-MM-DD` date string.
pub fn parse_plain_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Anchor a calendar date at noon UTC.
fn noon_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    Some(date.and_hms_opt(12, 0, 0)?.and_utc())
}

/// Whole calendar days from `start` to `today` (negative when `today` is
/// earlier). Returns `None` when either string is not a parseable
/// `YYYY-MM-DD` date.
pub fn diff_in_days(today: &str, start: &str) -> Option<i64> {
    let today = noon_utc(parse_plain_date(today)?)?;
    let start = noon_utc(parse_plain_date(start)?)?;
    Some(today.signed_duration_since(start).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_in_days_forward() {
        assert_eq!(diff_in_days("2024-01-08", "2024-01-01"), Some(7));
    }

    #[test]
    fn test_diff_in_days_same_day() {
        assert_eq!(diff_in_days("2024-01-01", "2024-01-01"), Some(0));
    }

    #[test]
    fn test_diff_in_days_before_start() {
        assert_eq!(diff_in_days("2023-12-30", "2024-01-01"), Some(-2));
    }

    #[test]
    fn test_diff_in_days_across_dst_boundary() {
        // US DST starts 2024-03-10; noon anchoring keeps the count exact.
        assert_eq!(diff_in_days("2024-03-11", "2024-03-09"), Some(2));
    }

    #[test]
    fn test_diff_in_days_rejects_garbage() {
        assert_eq!(diff_in_days("not-a-date", "2024-01-01"), None);
        assert_eq!(diff_in_days("2024-01-01", ""), None);
    }

    #[test]
    fn test_parse_plain_date_trims_whitespace() {
        assert!(parse_plain_date(" 2024-06-15 ").is_some());
    }
}
