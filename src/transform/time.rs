//! Timestamp derivation and decomposition
//!
//! `ts` is epoch milliseconds. The derived `start_time` is the UTC instant
//! at millisecond precision; calendar fields are computed in the configured
//! fixed offset.

use crate::schema::TimeRow;
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

/// Instant for an epoch-millisecond value, `None` when out of range
pub fn start_time_from_millis(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts)
}

/// Decompose an instant into a `time` row
///
/// `week` and `weekday` follow ISO-8601: weeks start on Monday, week 1
/// holds the year's first Thursday, and weekday runs 1 (Monday) to 7
/// (Sunday).
pub fn decompose(start_time: DateTime<Utc>, offset: &FixedOffset) -> TimeRow {
    let local = start_time.with_timezone(offset);
    TimeRow {
        start_time,
        hour: local.hour() as i32,
        day: local.day() as i32,
        week: local.iso_week().week() as i32,
        month: local.month() as i32,
        year: local.year(),
        weekday: local.weekday().number_from_monday() as i32,
    }
}
