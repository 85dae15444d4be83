//! ISO-8601 timestamp handling for order records.
//!
//! Timestamps are written as RFC 3339 strings with microsecond precision and an
//! explicit `+00:00` offset. Reads also accept a trailing `Z` and the naive
//! (offset-less) form written by earlier deployments, which is taken as UTC.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};

use crate::contract::ValidationError;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, false)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(truncate_to_micros(parsed.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(trimmed, NAIVE_FORMAT)
        .map(|naive| truncate_to_micros(naive.and_utc()))
        .map_err(|_| ValidationError::new(format!("Invalid ISO-8601 timestamp: '{value}'")))
}

/// Current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> {
    truncate_to_micros(Utc::now())
}

/// Smallest stored timestamp that is not earlier than `now` and strictly
/// later than `previous`.
pub fn next_after(previous: &DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = *previous + Duration::microseconds(1);
    truncate_to_micros(now).max(floor)
}

fn truncate_to_micros(value: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = value.timestamp_subsec_nanos();
    value - Duration::nanoseconds(i64::from(nanos % 1_000))
}

pub(crate) fn serialize_timestamp<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_timestamp(value))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn trailing_z_is_normalized_to_explicit_offset() {
        let parsed = parse_timestamp("2026-03-01T10:15:30.123456Z").expect("timestamp");
        assert_eq!(format_timestamp(&parsed), "2026-03-01T10:15:30.123456+00:00");
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let parsed = parse_timestamp("2026-03-01T10:15:30.5").expect("timestamp");
        let expected = Utc
            .with_ymd_and_hms(2026, 3, 1, 10, 15, 30)
            .single()
            .expect("valid date")
            + Duration::milliseconds(500);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn offsets_are_converted_to_utc() {
        let parsed = parse_timestamp("2026-03-01T12:00:00+02:00").expect("timestamp");
        assert_eq!(format_timestamp(&parsed), "2026-03-01T10:00:00.000000+00:00");
    }

    #[test]
    fn rejects_garbage() {
        let error = parse_timestamp("yesterday").expect_err("should fail");
        assert!(error.message().contains("Invalid ISO-8601 timestamp"));
    }

    #[test]
    fn next_after_is_strictly_later_even_when_clock_stalls() {
        let previous = parse_timestamp("2026-03-01T10:00:00.000001+00:00").expect("timestamp");
        let stalled_clock = previous;
        let next = next_after(&previous, stalled_clock);
        assert!(next > previous);
        assert_eq!(format_timestamp(&next), "2026-03-01T10:00:00.000002+00:00");
    }

    #[test]
    fn next_after_uses_clock_when_it_moved_forward() {
        let previous = parse_timestamp("2026-03-01T10:00:00+00:00").expect("timestamp");
        let later = parse_timestamp("2026-03-01T11:00:00+00:00").expect("timestamp");
        assert_eq!(next_after(&previous, later), later);
    }
}
