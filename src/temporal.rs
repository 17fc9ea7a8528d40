//! Temporal key extraction.
//!
//! Both sources carry dates in different textual forms. Trips carry a
//! `yyyy-MM-dd HH:mm:ss` start time, readings a `MM/dd/yyyy` date. Both are
//! reduced to a `NaiveDate` before any comparison so the join predicate
//! never compares across representations.

use crate::constants::{READING_DATE_FORMAT, TRIP_DATE_FORMAT, TRIP_TIMESTAMP_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};

/// Parse a trip start time.
///
/// Surrounding whitespace is trimmed. A trailing fractional-seconds part
/// (`.1230`) is accepted and discarded; anything else that does not match
/// the pattern yields `None`.
pub fn parse_trip_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let (timestamp, remainder) =
        NaiveDateTime::parse_and_remainder(raw.trim(), TRIP_TIMESTAMP_FORMAT).ok()?;

    if is_fractional_seconds(remainder) {
        Some(timestamp)
    } else {
        None
    }
}

fn is_fractional_seconds(remainder: &str) -> bool {
    match remainder.strip_prefix('.') {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => remainder.is_empty(),
    }
}

/// Render the calendar date of a timestamp as `yyyy-MM-dd`
pub fn format_trip_date(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TRIP_DATE_FORMAT).to_string()
}

/// Parse a reading date written as `MM/dd/yyyy`
pub fn parse_reading_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), READING_DATE_FORMAT).ok()
}
