//! Feature derivation helpers
//!
//! Shared building blocks for the per-dataset derivers:
//! - Canonical weekday/month orderings and grouping that keeps empty categories
//! - Calendar breakdown of timestamps
//! - Decimal-hour and two-decimal rounding
//! - Lenient parsing of the timestamp shapes found in exported CSV files

use chrono::{DateTime, Datelike, Duration, Month, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::types::Calendar;

/// Weekday names in canonical order (Monday first)
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Month names in canonical order
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Weekday index, Monday = 0 .. Sunday = 6
pub fn weekday_index(weekday: Weekday) -> u32 {
    weekday.num_days_from_monday()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// Month index, January = 1 .. December = 12
pub fn month_index(month: Month) -> u32 {
    month.number_from_month()
}

pub fn month_name(month: Month) -> &'static str {
    MONTH_NAMES[month.number_from_month() as usize - 1]
}

/// Break a timestamp into weekday, month and year
pub fn calendar(timestamp: NaiveDateTime) -> Calendar {
    calendar_of_date(timestamp.date())
}

pub fn calendar_of_date(date: NaiveDate) -> Calendar {
    // month() is always 1..=12
    let month = Month::try_from(date.month() as u8).unwrap_or(Month::January);
    Calendar {
        weekday: date.weekday(),
        month,
        year: date.year(),
    }
}

/// Round to two decimal places (half away from zero)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `hour + minute / 60`, rounded to two decimals
pub fn decimal_hour(timestamp: NaiveDateTime) -> f64 {
    round2(timestamp.hour() as f64 + timestamp.minute() as f64 / 60.0)
}

/// Shift a timestamp by a whole number of hours
pub fn shift_hours(timestamp: NaiveDateTime, hours: i32) -> NaiveDateTime {
    timestamp + Duration::hours(hours as i64)
}

/// Group values by weekday, always returning all seven weekdays in canonical
/// order, empty ones included.
pub fn group_by_weekday<T>(
    rows: &[T],
    key: impl Fn(&T) -> Weekday,
    value: impl Fn(&T) -> f64,
) -> Vec<(&'static str, Vec<f64>)> {
    let mut groups: Vec<(&'static str, Vec<f64>)> =
        WEEKDAY_NAMES.iter().map(|name| (*name, Vec::new())).collect();
    for row in rows {
        groups[weekday_index(key(row)) as usize].1.push(value(row));
    }
    groups
}

/// Group values by month, always returning all twelve months in canonical
/// order, empty ones included.
pub fn group_by_month<T>(
    rows: &[T],
    key: impl Fn(&T) -> Month,
    value: impl Fn(&T) -> f64,
) -> Vec<(&'static str, Vec<f64>)> {
    let mut groups: Vec<(&'static str, Vec<f64>)> =
        MONTH_NAMES.iter().map(|name| (*name, Vec::new())).collect();
    for row in rows {
        groups[month_index(key(row)) as usize - 1].1.push(value(row));
    }
    groups
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp cell.
///
/// Accepts epoch seconds (integer or fractional), ISO datetimes with or
/// without fractional seconds, RFC 3339 with an offset (converted to UTC),
/// and bare ISO dates (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(secs) = value.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    if let Ok(secs) = value.parse::<f64>() {
        if !secs.is_finite() {
            return None;
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round() as u32;
        return DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            .map(|dt| dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parse a date cell; anything [`parse_timestamp`] accepts is truncated to its day
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_timestamp(value).map(|ts| ts.date())
}

/// Parse a bare time of day (`HH:MM` or `HH:MM:SS`)
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(5.0), 5.0);
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(2.344), 2.34);
        assert!(round2(f64::NAN).is_nan());
    }

    #[test]
    fn test_decimal_hour() {
        assert_eq!(decimal_hour(ts("2023-01-01 23:30:00")), 23.5);
        // 7 + 20/60 = 7.333..
        assert_eq!(decimal_hour(ts("2023-01-01 07:20:59")), 7.33);
        assert_eq!(decimal_hour(ts("2023-01-01 00:00:00")), 0.0);
    }

    #[test]
    fn test_shift_hours_crosses_midnight() {
        let shifted = shift_hours(ts("2023-01-01 22:00:00"), 7);
        assert_eq!(shifted, ts("2023-01-02 05:00:00"));
        assert_eq!(shift_hours(shifted, -7), ts("2023-01-01 22:00:00"));
    }

    #[test]
    fn test_calendar_breakdown() {
        // 2023-01-01 was a Sunday
        let cal = calendar(ts("2023-01-01 10:00:00"));
        assert_eq!(cal.weekday, Weekday::Sun);
        assert_eq!(weekday_index(cal.weekday), 6);
        assert_eq!(weekday_name(cal.weekday), "Sunday");
        assert_eq!(cal.month, Month::January);
        assert_eq!(month_index(cal.month), 1);
        assert_eq!(month_name(cal.month), "January");
        assert_eq!(cal.year, 2023);
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let expected = ts("2023-01-01 00:00:00");
        assert_eq!(parse_timestamp("1672531200"), Some(expected));
        assert_eq!(parse_timestamp("1672531200.0"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01 00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01"), Some(expected));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_date_truncates() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(parse_date("1672574400"), Some(day)); // 12:00 UTC
        assert_eq!(parse_date("2023-01-01"), Some(day));
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("08:15"), NaiveTime::from_hms_opt(8, 15, 0));
        assert_eq!(parse_time_of_day("08:15:30"), NaiveTime::from_hms_opt(8, 15, 30));
        assert_eq!(parse_time_of_day("8h15"), None);
    }

    #[test]
    fn test_group_by_weekday_keeps_empty_categories() {
        let rows = vec![(Weekday::Mon, 1.0), (Weekday::Mon, 2.0), (Weekday::Sun, 3.0)];
        let groups = group_by_weekday(&rows, |r| r.0, |r| r.1);

        assert_eq!(groups.len(), 7);
        assert_eq!(groups[0], ("Monday", vec![1.0, 2.0]));
        assert_eq!(groups[3], ("Thursday", vec![]));
        assert_eq!(groups[6], ("Sunday", vec![3.0]));
    }

    #[test]
    fn test_group_by_month_keeps_empty_categories() {
        let rows = vec![(Month::March, 10.0)];
        let groups = group_by_month(&rows, |r| r.0, |r| r.1);

        assert_eq!(groups.len(), 12);
        assert_eq!(groups[2], ("March", vec![10.0]));
        assert!(groups.iter().filter(|g| g.1.is_empty()).count() == 11);
    }
}
