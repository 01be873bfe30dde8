//! Follow-Through-Day (FTD) state machine (spec §4.6).

use crate::config::MarketRegimeConfig;
use crate::domain::market_regime::MarketPhase;
use crate::domain::types::Bar;

#[derive(Debug, Clone)]
pub struct FtdState {
    pub phase: MarketPhase,
    /// Index close on rally day 1, once a rally attempt begins.
    pub rally_day_1_low: Option<f64>,
    pub rally_day: Option<u32>,
    pub has_confirmed_ftd: bool,
    pub rally_failed_today: bool,
}

impl Default for FtdState {
    fn default() -> Self {
        Self {
            phase: MarketPhase::ConfirmedUptrend,
            rally_day_1_low: None,
            rally_day: None,
            has_confirmed_ftd: false,
            rally_failed_today: false,
        }
    }
}

/// Advance the FTD tracker by one trading day (spec §4.6).
///
/// `d_day_count` is the current rolling D-Day tally; `bars` must include
/// at least today's bar appended last.
pub fn advance(
    state: &FtdState,
    bars: &[Bar],
    d_day_count: u32,
    config: &MarketRegimeConfig,
) -> FtdState {
    use rust_decimal::prelude::ToPrimitive;

    let mut next = state.clone();
    next.rally_failed_today = false;

    let Some(today) = bars.last() else {
        return next;
    };
    let Some(close_today) = today.close.to_f64() else {
        return next;
    };
    let Some(low_today) = today.low.to_f64() else {
        return next;
    };

    match state.phase {
        MarketPhase::ConfirmedUptrend | MarketPhase::UptrendUnderPressure => {
            if d_day_count >= config.correction_d_day_threshold {
                next.phase = MarketPhase::Correction;
                next.rally_day = None;
                next.rally_day_1_low = None;
                next.has_confirmed_ftd = false;
            } else if d_day_count >= config.correction_d_day_threshold.saturating_sub(2) {
                next.phase = MarketPhase::UptrendUnderPressure;
            }
        }
        MarketPhase::Correction => {
            // A strong bottoming day starts a rally attempt: day 1 of the
            // attempt, tracked by its low.
            let prev_close = bars
                .iter()
                .rev()
                .nth(1)
                .and_then(|b| b.close.to_f64())
                .unwrap_or(close_today);
            if close_today > prev_close {
                next.phase = MarketPhase::RallyAttempt;
                next.rally_day = Some(1);
                next.rally_day_1_low = Some(low_today);
            }
        }
        MarketPhase::RallyAttempt => {
            let day1_low = state.rally_day_1_low.unwrap_or(low_today);
            if low_today < day1_low {
                // Undercut day-1 low: rally failed, back to correction.
                next.phase = MarketPhase::Correction;
                next.rally_day = None;
                next.rally_day_1_low = None;
                next.rally_failed_today = true;
                return next;
            }

            let rally_day = state.rally_day.unwrap_or(1) + 1;
            next.rally_day = Some(rally_day);

            if rally_day >= config.ftd_min_rally_day {
                let prev_close = bars
                    .iter()
                    .rev()
                    .nth(1)
                    .and_then(|b| b.close.to_f64())
                    .unwrap_or(close_today);
                let prev_volume = bars.iter().rev().nth(1).map(|b| b.volume).unwrap_or(0);
                let gain_pct = if prev_close != 0.0 {
                    (close_today - prev_close) / prev_close * 100.0
                } else {
                    0.0
                };
                if gain_pct >= config.ftd_min_index_gain_pct && today.volume > prev_volume {
                    next.phase = MarketPhase::ConfirmedUptrend;
                    next.has_confirmed_ftd = true;
                    next.rally_day = None;
                    next.rally_day_1_low = None;
                }
            }
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: rust_decimal::Decimal, low: rust_decimal::Decimal, volume: u64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            open: close,
            high: close,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn correction_enters_on_high_d_day_count() {
        let config = MarketRegimeConfig::default();
        let state = FtdState {
            phase: MarketPhase::ConfirmedUptrend,
            ..Default::default()
        };
        let bars = vec![bar(1, dec!(100), dec!(99), 1_000_000)];
        let next = advance(&state, &bars, 6, &config);
        assert_eq!(next.phase, MarketPhase::Correction);
    }

    #[test]
    fn rally_attempt_begins_on_bottoming_day() {
        let config = MarketRegimeConfig::default();
        let state = FtdState {
            phase: MarketPhase::Correction,
            ..Default::default()
        };
        let bars = vec![bar(1, dec!(95), dec!(94), 1_000_000), bar(2, dec!(97), dec!(95), 1_000_000)];
        let next = advance(&state, &bars, 6, &config);
        assert_eq!(next.phase, MarketPhase::RallyAttempt);
        assert_eq!(next.rally_day, Some(1));
    }

    #[test]
    fn ftd_confirms_on_day_4_with_volume_and_gain() {
        let config = MarketRegimeConfig::default();
        let state = FtdState {
            phase: MarketPhase::RallyAttempt,
            rally_day: Some(3),
            rally_day_1_low: Some(94.0),
            ..Default::default()
        };
        let bars = vec![
            bar(1, dec!(97), dec!(95), 1_000_000),
            bar(2, dec!(98), dec!(96), 1_000_000),
            bar(3, dec!(99), dec!(97), 1_000_000),
            bar(4, dec!(101), dec!(98), 2_000_000),
        ];
        let next = advance(&state, &bars, 3, &config);
        assert_eq!(next.phase, MarketPhase::ConfirmedUptrend);
        assert!(next.has_confirmed_ftd);
    }
}
