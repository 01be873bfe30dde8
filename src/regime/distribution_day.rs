//! Distribution-day detection and the 25-session rolling window (spec
//! §4.6, §8 testable property 7).

use crate::config::DistributionDaysConfig;
use crate::domain::market_regime::DistributionDay;
use crate::domain::types::Bar;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;

/// A day qualifies as a D-Day when the index declined at or below
/// `decline_threshold` on volume at least `min_volume_increase_pct` above
/// the prior session (spec §4.6).
pub fn is_distribution_day(
    today: &Bar,
    yesterday: &Bar,
    config: &DistributionDaysConfig,
) -> bool {
    let Some(close_today) = today.close.to_f64() else {
        return false;
    };
    let Some(close_yesterday) = yesterday.close.to_f64() else {
        return false;
    };
    if close_yesterday == 0.0 {
        return false;
    }

    let decimals = config.decline_rounding_decimals;
    let scale = 10f64.powi(decimals as i32);
    let pct_change = ((close_today - close_yesterday) / close_yesterday * 100.0 * scale).round() / scale;

    if pct_change > config.decline_threshold {
        return false;
    }

    let volume_floor = yesterday.volume as f64 * (1.0 + config.min_volume_increase_pct / 100.0);
    today.volume as f64 > volume_floor
}

/// Build the `DistributionDay` record for a qualifying day.
pub fn record(symbol: &str, today: &Bar, yesterday: &Bar) -> DistributionDay {
    let close_today = today.close.to_f64().unwrap_or(0.0);
    let close_yesterday = yesterday.close.to_f64().unwrap_or(1.0);
    let pct_change = if close_yesterday != 0.0 {
        (close_today - close_yesterday) / close_yesterday * 100.0
    } else {
        0.0
    };
    let volume_ratio = if yesterday.volume > 0 {
        today.volume as f64 / yesterday.volume as f64
    } else {
        0.0
    };

    DistributionDay {
        symbol: symbol.to_string(),
        date: today.date,
        pct_change,
        volume_ratio,
        trigger_close: today.close,
        expired: false,
    }
}

/// Count of days still contributing to the current tally: within the
/// rolling session window *and* price has not advanced far enough above
/// the triggering close to retire it (spec §4.6, testable property 7).
pub fn active_count(
    days: &[DistributionDay],
    today: NaiveDate,
    sessions_since: impl Fn(NaiveDate, NaiveDate) -> u32,
    current_close: rust_decimal::Decimal,
    config: &DistributionDaysConfig,
) -> u32 {
    days.iter()
        .filter(|d| !d.expired && sessions_since(d.date, today) <= config.rolling_window_sessions)
        .filter(|d| {
            let advance_ceiling =
                d.trigger_close * (rust_decimal::Decimal::ONE + rust_decimal::Decimal::try_from(config.expire_on_advance_pct / 100.0).unwrap_or_default());
            current_close <= advance_ceiling
        })
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: rust_decimal::Decimal, volume: u64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn detects_decline_on_higher_volume() {
        let config = DistributionDaysConfig::default();
        let yesterday = bar(1, dec!(100), 1_000_000);
        let today = bar(2, dec!(99.5), 1_100_000);
        assert!(is_distribution_day(&today, &yesterday, &config));
    }

    #[test]
    fn rejects_decline_without_volume_increase() {
        let config = DistributionDaysConfig::default();
        let yesterday = bar(1, dec!(100), 1_000_000);
        let today = bar(2, dec!(99.5), 1_005_000);
        assert!(!is_distribution_day(&today, &yesterday, &config));
    }

    #[test]
    fn rejects_advance_days() {
        let config = DistributionDaysConfig::default();
        let yesterday = bar(1, dec!(100), 1_000_000);
        let today = bar(2, dec!(101), 2_000_000);
        assert!(!is_distribution_day(&today, &yesterday, &config));
    }
}
