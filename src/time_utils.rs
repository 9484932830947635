// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Storage format for naive local start times.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Format a naive local timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_local(date: NaiveDateTime) -> String {
    date.format(LOCAL_DATETIME_FORMAT).to_string()
}

/// Calendar date of a stored local timestamp.
pub fn parse_local_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, LOCAL_DATETIME_FORMAT).map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_utc_round_trip_uses_z_suffix() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 6, 30, 0).unwrap();
        let formatted = format_utc_rfc3339(date);
        assert_eq!(formatted, "2024-03-09T06:30:00Z");
        assert_eq!(parse_utc_rfc3339(&formatted).unwrap(), date);
    }

    #[test]
    fn test_parse_local_date_ignores_time_of_day() {
        let date = parse_local_date("2024-01-02 23:59:59").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_local_date_rejects_iso_t_separator() {
        assert!(parse_local_date("2024-01-02T08:00:00").is_err());
    }
}
