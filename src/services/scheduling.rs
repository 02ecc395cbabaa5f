use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;

/// Inclusive `[start, end]` bounds of a calendar day.
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    let end = date.and_time(
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    );
    (start, end)
}

/// Whether a booking that isn't cancelled already occupies `date`.
///
/// The schedule holds one engagement per calendar day, so time of day
/// plays no part here.
pub fn has_conflict(conn: &Connection, date: NaiveDate) -> anyhow::Result<bool> {
    let (day_start, day_end) = day_bounds(date);
    queries::live_booking_exists_in_range(conn, &day_start, &day_end)
}
