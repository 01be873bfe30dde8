//! Dynamic (price/volume) indicators consumed by the `Scorer` (spec §4.4
//! dynamic factors table). Each function is a pure value transform over a
//! bar slice, ordered oldest-to-newest.

use crate::domain::types::Bar;
use rust_decimal::prelude::ToPrimitive;
use statrs::statistics::Statistics;

fn to_f64_slice(values: impl Iterator<Item = rust_decimal::Decimal>) -> Vec<f64> {
    values.filter_map(|v| v.to_f64()).collect()
}

/// Ratio of above-average-volume up-days to above-average-volume down-days
/// over the trailing `window` bars (spec "Up/Down Vol Ratio").
pub fn up_down_volume_ratio(bars: &[Bar], window: usize) -> Option<f64> {
    if bars.len() < window + 1 || window == 0 {
        return None;
    }
    let slice = &bars[bars.len() - window..];
    let avg_volume = (slice.iter().map(|b| b.volume as f64).sum::<f64>()) / slice.len() as f64;
    if avg_volume <= 0.0 {
        return None;
    }

    let mut up_days = 0u32;
    let mut down_days = 0u32;
    for pair in slice.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if (curr.volume as f64) < avg_volume {
            continue;
        }
        if curr.close > prev.close {
            up_days += 1;
        } else if curr.close < prev.close {
            down_days += 1;
        }
    }
    if down_days == 0 {
        return Some(if up_days > 0 { f64::INFINITY } else { 0.0 });
    }
    Some(up_days as f64 / down_days as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaTrend {
    AboveRising,
    AboveFlat,
    Near,
    BelowRecent,
    BelowExtended,
}

/// Classify price position relative to the 50-day moving average (spec
/// "50-MA Position"). `ma_series` must be the trailing MA values aligned
/// with `bars` (same length), oldest-to-newest.
pub fn ma_50_position(bars: &[Bar], ma_series: &[f64], near_pct: f64) -> Option<MaTrend> {
    if bars.is_empty() || ma_series.len() != bars.len() {
        return None;
    }
    let close = bars.last()?.close.to_f64()?;
    let ma = *ma_series.last()?;
    if ma <= 0.0 {
        return None;
    }

    let pct_from_ma = (close - ma) / ma * 100.0;
    let rising = ma_series.len() >= 5 && ma > ma_series[ma_series.len() - 5];

    Some(if pct_from_ma.abs() <= near_pct {
        MaTrend::Near
    } else if close > ma {
        if rising {
            MaTrend::AboveRising
        } else {
            MaTrend::AboveFlat
        }
    } else if pct_from_ma > -10.0 {
        MaTrend::BelowRecent
    } else {
        MaTrend::BelowExtended
    })
}

/// Count of weeks where the weekly low touched within `tolerance_pct` of
/// the 10-week MA and closed above it (spec "10-Week Support Bounces").
/// `weekly_bars` must already be aggregated to weekly OHLCV, `ma_10w`
/// aligned 1:1.
pub fn ten_week_support_bounces(
    weekly_bars: &[Bar],
    ma_10w: &[f64],
    tolerance_pct: f64,
) -> i32 {
    let mut bounces = 0i32;
    for (bar, &ma) in weekly_bars.iter().zip(ma_10w.iter()) {
        if ma <= 0.0 {
            continue;
        }
        let Some(low) = bar.low.to_f64() else { continue };
        let Some(close) = bar.close.to_f64() else { continue };
        let touched = ((low - ma) / ma * 100.0).abs() <= tolerance_pct;
        if touched && close > ma {
            bounces += 1;
        }
    }
    bounces
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsTrendClass {
    AtNewHigh,
    Rising,
    Flat,
    Falling,
}

/// Relative-strength trend: linear regression slope of the stock/index
/// close ratio over the trailing window (spec "RS Trend"). Slope and
/// variance computed via `statrs`'s population statistics.
pub fn rs_trend(stock_bars: &[Bar], index_bars: &[Bar], window: usize) -> Option<RsTrendClass> {
    if stock_bars.len() < window || index_bars.len() < window || window < 2 {
        return None;
    }
    let s = &stock_bars[stock_bars.len() - window..];
    let idx = &index_bars[index_bars.len() - window..];
    let n = s.len().min(idx.len());

    let ratios: Vec<f64> = (0..n)
        .filter_map(|i| {
            let stock_close = s[i].close.to_f64()?;
            let index_close = idx[i].close.to_f64()?;
            if index_close == 0.0 {
                None
            } else {
                Some(stock_close / index_close)
            }
        })
        .collect();
    if ratios.len() < 2 {
        return None;
    }

    let xs: Vec<f64> = (0..ratios.len()).map(|i| i as f64).collect();
    let x_var = xs.clone().variance();
    if x_var <= 0.0 {
        return Some(RsTrendClass::Flat);
    }
    let covariance = xs.iter().copied().zip(ratios.iter().copied()).fold(0.0, |acc, (x, y)| {
        acc + (x - xs.clone().mean()) * (y - ratios.clone().mean())
    }) / (ratios.len() as f64 - 1.0);
    let slope = covariance / x_var;

    let is_new_high = ratios.last().copied().unwrap_or(0.0) >= ratios.clone().max();
    let mean_ratio = ratios.clone().mean();
    let relative_slope = if mean_ratio != 0.0 {
        slope / mean_ratio
    } else {
        slope
    };

    Some(if is_new_high {
        RsTrendClass::AtNewHigh
    } else if relative_slope > 0.001 {
        RsTrendClass::Rising
    } else if relative_slope < -0.001 {
        RsTrendClass::Falling
    } else {
        RsTrendClass::Flat
    })
}

/// Ratio of recent (trailing `recent_days`) average volume to base-period
/// average volume (spec "Volume Dry-Up").
pub fn volume_dry_up_ratio(bars: &[Bar], recent_days: usize, base_days: usize) -> Option<f64> {
    if bars.len() < recent_days + base_days {
        return None;
    }
    let recent = &bars[bars.len() - recent_days..];
    let base = &bars[bars.len() - recent_days - base_days..bars.len() - recent_days];

    let recent_avg = recent.iter().map(|b| b.volume as f64).sum::<f64>() / recent.len() as f64;
    let base_avg = base.iter().map(|b| b.volume as f64).sum::<f64>() / base.len() as f64;
    if base_avg <= 0.0 {
        return None;
    }
    Some(recent_avg / base_avg)
}

/// Aggregate daily bars into calendar-week OHLCV bars, oldest-to-newest,
/// using each bar's ISO week as the grouping key.
pub fn aggregate_weekly(daily: &[Bar]) -> Vec<Bar> {
    use chrono::Datelike;
    use std::collections::BTreeMap;

    let mut weeks: BTreeMap<(i32, u32), Vec<Bar>> = BTreeMap::new();
    for bar in daily {
        let iso = bar.date.iso_week();
        weeks.entry((iso.year(), iso.week())).or_default().push(*bar);
    }

    weeks
        .into_values()
        .map(|mut group| {
            group.sort_by_key(|b| b.date);
            let open = group.first().unwrap().open;
            let close = group.last().unwrap().close;
            let date = group.last().unwrap().date;
            let high = group.iter().map(|b| b.high).fold(open, |a, b| a.max(b));
            let low = group.iter().map(|b| b.low).fold(open, |a, b| a.min(b));
            let volume = group.iter().map(|b| b.volume).sum();
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}

/// Simple moving average series aligned 1:1 with `bars`; the first
/// `period - 1` entries are the running average of what's available so
/// indicators can still be evaluated against a short warm-up window.
pub fn moving_average_series(bars: &[Bar], period: usize) -> Vec<f64> {
    let closes = to_f64_slice(bars.iter().map(|b| b.close));
    let mut out = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let start = i.saturating_sub(period - 1);
        let window = &closes[start..=i];
        out.push(window.iter().sum::<f64>() / window.len() as f64);
    }
    out
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
    fn volume_dry_up_detects_quiet_recent_trading() {
        let mut bars = Vec::new();
        for d in 1..=10 {
            bars.push(bar(d, dec!(100), 1_000_000));
        }
        for d in 11..=15 {
            bars.push(bar(d, dec!(100), 300_000));
        }
        let ratio = volume_dry_up_ratio(&bars, 5, 10).unwrap();
        assert!(ratio < 0.5);
    }

    #[test]
    fn ma_position_detects_above_rising() {
        let bars: Vec<Bar> = (1..=10).map(|d| bar(d, dec!(100) + rust_decimal::Decimal::from(d), 500_000)).collect();
        let ma = moving_average_series(&bars, 5);
        let trend = ma_50_position(&bars, &ma, 2.0).unwrap();
        assert_eq!(trend, MaTrend::AboveRising);
    }

    #[test]
    fn weekly_aggregation_groups_by_iso_week() {
        let bars: Vec<Bar> = (1..=14).map(|d| bar(d, dec!(100), 100_000)).collect();
        let weekly = aggregate_weekly(&bars);
        assert!(weekly.len() >= 2);
    }
}
