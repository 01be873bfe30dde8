//! Deterministic US equity holiday calendar, computed with no network
//! dependency (spec §4.1 "deterministic hardcoded calendar"). Grounded on
//! `original_source/utils/market_calendar.py`'s `_get_fallback_holidays`.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

/// Sat -> observed Fri, Sun -> observed Mon.
fn observe(d: NaiveDate) -> NaiveDate {
    match d.weekday() {
        Weekday::Sat => d.pred_opt().unwrap(),
        Weekday::Sun => d.succ_opt().unwrap(),
        _ => d,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let mut days_ahead = weekday.num_days_from_monday() as i64 - first.weekday().num_days_from_monday() as i64;
    if days_ahead < 0 {
        days_ahead += 7;
    }
    let first_occurrence = first + chrono::Duration::days(days_ahead);
    first_occurrence + chrono::Duration::weeks((n - 1) as i64)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let last_day = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap().pred_opt().unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap().pred_opt().unwrap()
    };
    let mut days_back = last_day.weekday().num_days_from_monday() as i64 - weekday.num_days_from_monday() as i64;
    if days_back < 0 {
        days_back += 7;
    }
    last_day - chrono::Duration::days(days_back)
}

/// Good Friday via the Meeus/Jones/Butcher Easter algorithm (spec §4.1, §8
/// testable property 9: must match published dates 2020-2030).
pub fn good_friday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;
    let easter = NaiveDate::from_ymd_opt(year, month as u32, day as u32).unwrap();
    easter - chrono::Duration::days(2)
}

pub fn holidays_for_year(year: i32) -> HashSet<NaiveDate> {
    let mut holidays = HashSet::new();

    holidays.insert(observe(NaiveDate::from_ymd_opt(year, 1, 1).unwrap()));
    holidays.insert(nth_weekday(year, 1, Weekday::Mon, 3)); // MLK Day
    holidays.insert(nth_weekday(year, 2, Weekday::Mon, 3)); // Presidents Day
    holidays.insert(good_friday(year));
    holidays.insert(last_weekday(year, 5, Weekday::Mon)); // Memorial Day

    if year >= 2022 {
        holidays.insert(observe(NaiveDate::from_ymd_opt(year, 6, 19).unwrap()));
    }

    holidays.insert(observe(NaiveDate::from_ymd_opt(year, 7, 4).unwrap()));
    holidays.insert(nth_weekday(year, 9, Weekday::Mon, 1)); // Labor Day
    holidays.insert(nth_weekday(year, 11, Weekday::Thu, 4)); // Thanksgiving
    holidays.insert(observe(NaiveDate::from_ymd_opt(year, 12, 25).unwrap()));

    holidays
}

pub fn early_close_days_for_year(year: i32) -> HashSet<NaiveDate> {
    let mut early_close = HashSet::new();
    let holidays = holidays_for_year(year);

    let july_3 = NaiveDate::from_ymd_opt(year, 7, 3).unwrap();
    if !holidays.contains(&july_3) && july_3.weekday().num_days_from_monday() < 5 {
        early_close.insert(july_3);
    }

    let thanksgiving = nth_weekday(year, 11, Weekday::Thu, 4);
    early_close.insert(thanksgiving + chrono::Duration::days(1)); // Black Friday

    let christmas_eve = NaiveDate::from_ymd_opt(year, 12, 24).unwrap();
    if !holidays.contains(&christmas_eve) && christmas_eve.weekday().num_days_from_monday() < 5 {
        early_close.insert(christmas_eve);
    }

    early_close
}

pub fn is_holiday(date: NaiveDate) -> bool {
    holidays_for_year(date.year()).contains(&date)
        || (date.month() == 12 && date.day() == 31 && holidays_for_year(date.year() + 1).contains(&date))
}

pub fn is_early_close(date: NaiveDate) -> bool {
    early_close_days_for_year(date.year()).contains(&date)
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < 5 && !is_holiday(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_friday_matches_published_dates_2020_2030() {
        let expected = [
            (2020, 4, 10),
            (2021, 4, 2),
            (2022, 4, 15),
            (2023, 4, 7),
            (2024, 3, 29),
            (2025, 4, 18),
            (2026, 4, 3),
            (2027, 3, 26),
            (2028, 4, 14),
            (2029, 3, 30),
            (2030, 4, 19),
        ];
        for (year, month, day) in expected {
            assert_eq!(
                good_friday(year),
                NaiveDate::from_ymd_opt(year, month, day).unwrap(),
                "mismatch for {year}"
            );
        }
    }

    #[test]
    fn weekend_holiday_is_observed() {
        // July 4, 2021 was a Sunday; observed Monday July 5.
        let holidays = holidays_for_year(2021);
        assert!(holidays.contains(&NaiveDate::from_ymd_opt(2021, 7, 5).unwrap()));
    }

    #[test]
    fn juneteenth_absent_before_2022() {
        assert!(!holidays_for_year(2021).contains(&NaiveDate::from_ymd_opt(2021, 6, 18).unwrap()));
        assert!(holidays_for_year(2022).contains(&NaiveDate::from_ymd_opt(2022, 6, 20).unwrap()));
    }

    #[test]
    fn weekend_is_not_a_trading_day() {
        // Saturday.
        assert!(!is_trading_day(NaiveDate::from_ymd_opt(2026, 1, 3).unwrap()));
    }
}
