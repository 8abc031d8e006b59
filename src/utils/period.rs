// src/utils/period.rs

use std::sync::Mutex;

use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::models::usage::Period;

/// Source of "today" for period accounting.
///
/// The tracker never reads the wall clock directly so tests can pin the date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Calendar date in the server's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that stays on one date until moved.
#[derive(Debug)]
pub struct FixedClock {
    date: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }

    pub fn advance_days(&self, days: i64) {
        let mut date = self.date.lock().unwrap_or_else(|e| e.into_inner());
        *date += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// ISO-8601 week-year and week number.
///
/// Weeks start on Monday and belong to the year that holds their Thursday,
/// so the week containing the year's first Thursday is week 1.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let offset = i64::from(date.weekday().num_days_from_monday());
    let thursday = date + Duration::days(3 - offset);
    (thursday.year(), thursday.ordinal0() / 7 + 1)
}

/// Key of the accounting window that contains `date`.
///
/// * Daily: `YYYY-MM-DD`
/// * Weekly: `YYYY-WW` (ISO week-year, zero-padded week)
pub fn current_period_key(period: Period, date: NaiveDate) -> String {
    match period {
        Period::Daily => date.format("%Y-%m-%d").to_string(),
        Period::Weekly => {
            let (year, week) = iso_week(date);
            format!("{}-{:02}", year, week)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_key_is_calendar_date() {
        assert_eq!(current_period_key(Period::Daily, day(2024, 3, 9)), "2024-03-09");
    }

    #[test]
    fn test_weekly_key_stable_across_iso_week() {
        let monday = day(2024, 1, 1);
        let key = current_period_key(Period::Weekly, monday);
        assert_eq!(key, "2024-01");

        for offset in 0..7 {
            let date = monday + Duration::days(offset);
            assert_eq!(current_period_key(Period::Weekly, date), key, "{}", date);
        }

        assert_eq!(current_period_key(Period::Weekly, day(2024, 1, 8)), "2024-02");
    }

    #[test]
    fn test_weekly_key_uses_week_year_at_boundaries() {
        // 2021-01-03 is a Sunday in the last week of 2020.
        assert_eq!(current_period_key(Period::Weekly, day(2021, 1, 3)), "2020-53");
        assert_eq!(current_period_key(Period::Weekly, day(2021, 1, 4)), "2021-01");
        // 2024-12-30 is a Monday whose Thursday falls in 2025.
        assert_eq!(current_period_key(Period::Weekly, day(2024, 12, 30)), "2025-01");
    }

    #[test]
    fn test_iso_week_agrees_with_chrono() {
        let mut date = day(2019, 12, 1);
        while date < day(2027, 2, 1) {
            let iso = date.iso_week();
            assert_eq!(iso_week(date), (iso.year(), iso.week()), "{}", date);
            date += Duration::days(1);
        }
    }

    #[test]
    fn test_fixed_clock_moves_only_when_told() {
        let clock = FixedClock::new(day(2024, 5, 1));
        assert_eq!(clock.today(), day(2024, 5, 1));

        clock.advance_days(1);
        assert_eq!(clock.today(), day(2024, 5, 2));

        clock.set(day(2023, 1, 1));
        assert_eq!(clock.today(), day(2023, 1, 1));
    }
}
