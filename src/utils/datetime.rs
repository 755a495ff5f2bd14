//! Time-of-day arithmetic for the daily quiz schedule.
//!
//! Everything here is pure: callers pass `now` in, so the functions behave the
//! same in tests and in production regardless of the wall clock.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

/// Next timestamp at `slot` in the timezone of `now`.
///
/// Only hours are compared: when the current hour is at or past the slot's hour the
/// result lands on the following day. `None` only when that wall-clock time does
/// not exist (DST gap).
pub fn next_occurrence<Tz: TimeZone>(slot: NaiveTime, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let today = now.date_naive();
    let date = if now.hour() >= slot.hour() {
        today.checked_add_days(Days::new(1))?
    } else {
        today
    };

    at_local(&now.timezone(), date, slot.with_second(0)?)
}

/// Same hour and minute as `previous`, dated the day after `now`.
///
/// The date comes from `now`, not from `previous`: after a missed tick the next
/// fire time is still "tomorrow" relative to the moment of the call.
pub fn advance_by_one_day<Tz: TimeZone>(
    previous: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let tomorrow = now.date_naive().checked_add_days(Days::new(1))?;
    at_local(&previous.timezone(), tomorrow, previous.time())
}

/// Drops seconds and sub-second precision
pub fn truncate_to_minute<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| now.clone())
}

/// `HH:MM` rendering used in messages and storage
pub fn format_slot(slot: NaiveTime) -> String {
    slot.format("%H:%M").to_string()
}

pub fn format_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%A, %B %d at %H:%M").to_string()
}

fn at_local<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn berlin() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        berlin().with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn slot(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let next = next_occurrence(slot(10, 0), &at(2024, 3, 5, 9, 59)).unwrap();
        assert_eq!(next, at(2024, 3, 5, 10, 0));
    }

    #[test]
    fn test_next_occurrence_equal_hour_goes_to_tomorrow() {
        let next = next_occurrence(slot(10, 0), &at(2024, 3, 5, 10, 0)).unwrap();
        assert_eq!(next, at(2024, 3, 6, 10, 0));
    }

    #[test]
    fn test_next_occurrence_ignores_minutes() {
        // 10:05 is still "the 10 o'clock hour", so 10:30 moves to tomorrow
        let next = next_occurrence(slot(10, 30), &at(2024, 3, 5, 10, 5)).unwrap();
        assert_eq!(next, at(2024, 3, 6, 10, 30));
    }

    #[test]
    fn test_next_occurrence_keeps_timezone() {
        let next = next_occurrence(slot(3, 0), &at(2024, 3, 5, 22, 0)).unwrap();
        assert_eq!(next.offset(), &berlin());
        assert_eq!(next, at(2024, 3, 6, 3, 0));
    }

    #[test]
    fn test_advance_by_one_day_uses_now_for_the_date() {
        let previous = at(2024, 2, 1, 9, 0);
        let now = at(2024, 2, 20, 9, 0);
        let next = advance_by_one_day(&previous, &now).unwrap();
        assert_eq!(next, at(2024, 2, 21, 9, 0));
    }

    #[test]
    fn test_advance_by_one_day_rolls_over_year() {
        let previous = at(2024, 12, 31, 21, 0);
        let next = advance_by_one_day(&previous, &previous).unwrap();
        assert_eq!(next, at(2025, 1, 1, 21, 0));
    }

    #[test]
    fn test_advance_by_one_day_rolls_over_leap_february() {
        let previous = at(2024, 2, 29, 6, 15);
        let next = advance_by_one_day(&previous, &previous).unwrap();
        assert_eq!(next, at(2024, 3, 1, 6, 15));
        assert_eq!((next.hour(), next.minute()), (6, 15));
    }

    #[test]
    fn test_advance_by_one_day_after_missed_ticks_skips_to_tomorrow() {
        // Last fire was three days ago; the result is still now + 1 day, so
        // today's 12:00 slot is skipped
        let previous = at(2024, 5, 1, 12, 0);
        let now = at(2024, 5, 4, 8, 0);
        assert_eq!(advance_by_one_day(&previous, &now).unwrap(), at(2024, 5, 5, 12, 0));
    }

    #[test]
    fn test_truncate_to_minute() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 42).unwrap()
            + chrono::Duration::milliseconds(250);
        let truncated = truncate_to_minute(&now);
        assert_eq!(truncated, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_format_slot() {
        assert_eq!(format_slot(slot(9, 0)), "09:00");
        assert_eq!(format_slot(slot(0, 0)), "00:00");
    }
}
