//! Conversions between wall-clock time and BACnetDateTime.

use bactrend_core::types::{Date, DateTime, Time};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Local wall-clock time, as trend-log timestamps are recorded.
pub fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Second-resolution BACnetDateTime. Years outside 1900..=2154 are clamped.
pub fn to_bacnet(ts: NaiveDateTime) -> DateTime {
    let date = Date {
        year_since_1900: (ts.year() - 1900).clamp(0, 254) as u8,
        month: ts.month() as u8,
        day: ts.day() as u8,
        weekday: ts.weekday().number_from_monday() as u8,
    };
    DateTime::new(date, Time::hms(ts.hour() as u8, ts.minute() as u8, ts.second() as u8))
}

/// `None` when a field is unspecified (0xFF) or out of range.
pub fn from_bacnet(dt: DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        i32::from(dt.date.year()),
        u32::from(dt.date.month),
        u32::from(dt.date.day),
    )?
    .and_hms_opt(
        u32::from(dt.time.hour),
        u32::from(dt.time.minute),
        u32::from(dt.time.second),
    )
}
