//! Timestamp normalization and watermark formatting.
//!
//! The provider emits ISO-8601 timestamps with and without offsets. All
//! values are normalized to UTC instants; naive values are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Watermark sent when no run has completed yet ("beginning of time").
pub const EPOCH_WATERMARK: &str = "2000-01-01";

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a provider timestamp into a UTC instant.
///
/// Accepts RFC 3339, ISO-8601 with a numeric offset, naive date-times
/// (`T` or space separated, optional fraction) and bare dates.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats the resume watermark sent as the feed's `changed_at` filter.
///
/// The provider filters by calendar day, so records from the watermark's
/// own day are fetched again and re-applied idempotently.
///
/// The date is the UTC day of `last_changed_at`. The provider is assumed
/// to compare `changed_at` against UTC days as well; a provider filtering
/// in another zone could skip records near midnight.
#[must_use]
pub fn format_watermark(last_changed_at: Option<DateTime<Utc>>) -> String {
    last_changed_at.map_or_else(
        || EPOCH_WATERMARK.to_string(),
        |ts| ts.format("%Y-%m-%d").to_string(),
    )
}

/// Serde adapter for [`parse_instant`].
///
/// # Errors
///
/// Fails when the value is not a string or is not a recognized timestamp.
pub fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw:?}")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        let Some(dt) = Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single() else {
            panic!("valid date");
        };
        dt
    }

    #[test]
    fn offset_is_converted_to_utc() {
        assert_eq!(
            parse_instant("2024-05-01T12:00:00+03:00"),
            Some(utc(2024, 5, 1, 9, 0, 0))
        );
        assert_eq!(
            parse_instant("2024-05-01T12:00:00Z"),
            Some(utc(2024, 5, 1, 12, 0, 0))
        );
    }

    #[test]
    fn naive_values_are_utc() {
        assert_eq!(
            parse_instant("2024-05-01T12:00:00"),
            Some(utc(2024, 5, 1, 12, 0, 0))
        );
        assert_eq!(
            parse_instant("2024-05-01 12:00:00.250"),
            Some(utc(2024, 5, 1, 12, 0, 0) + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_instant("2024-05-01"), Some(utc(2024, 5, 1, 0, 0, 0)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_instant("yesterday"), None);
        assert_eq!(parse_instant(""), None);
    }

    #[test]
    fn watermark_uses_calendar_day() {
        assert_eq!(format_watermark(None), EPOCH_WATERMARK);
        assert_eq!(
            format_watermark(Some(utc(2024, 5, 1, 23, 59, 59))),
            "2024-05-01"
        );
    }

    #[test]
    fn watermark_day_is_taken_in_utc() {
        // 23:30 at -02:00 is already the next day in UTC.
        let Some(changed_at) = parse_instant("2024-05-01T23:30:00-02:00") else {
            panic!("offset timestamp should parse");
        };
        assert_eq!(format_watermark(Some(changed_at)), "2024-05-02");
    }
}
