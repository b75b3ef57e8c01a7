use std::fmt::Display;

use chrono::{DateTime, TimeZone};

/// Live clock face, e.g. `09:05:03`.
pub fn format_clock_time<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format("%H:%M:%S").to_string()
}

/// Long date under the clock face, e.g. `Monday, October 19, 2026`.
pub fn format_long_date<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format("%A, %B %-d, %Y").to_string()
}

/// Timestamp of a history row, e.g. `10/19 09:05:03`.
pub fn format_record_time<Tz: TimeZone>(moment: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    moment.format("%m/%d %H:%M:%S").to_string()
}
