//! Date parsing and comparison helpers.
//!
//! Dates are absolute instants at minute resolution, ISO 8601, no timezone.
//! Seconds are accepted on input and truncated.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::error::GraphError;

/// Parses an ISO 8601 date or date-time string into a minute-resolution
/// instant.
///
/// Accepted forms: `2026-01-01`, `2026-01-01T06:30`, `2026-01-01T06:30:15`
/// (seconds truncated).
pub fn parse_date(value: &str) -> Result<NaiveDateTime, GraphError> {
    let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| {
                d.and_hms_opt(0, 0, 0)
                    .expect("midnight is a valid time of day")
            })
        });
    match parsed {
        Ok(date) => Ok(truncate_to_minute(date)),
        Err(err) => Err(GraphError::BadDate {
            value: value.to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Drops seconds and sub-second precision.
pub fn truncate_to_minute(date: NaiveDateTime) -> NaiveDateTime {
    date.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .expect("zero seconds is a valid time of day")
}

/// Half-open range test: `start` inclusive, `stop` exclusive.
pub fn date_in_range(date: NaiveDateTime, start: NaiveDateTime, stop: NaiveDateTime) -> bool {
    start <= date && date < stop
}
