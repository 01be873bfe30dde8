//! `RegimeCalculator`: combines distribution-day counts, FTD state, index
//! futures bias, and sentiment into the daily composite regime score (spec
//! §4.6).

use crate::config::MarketRegimeConfig;
use crate::domain::market_regime::{DDayTrend, MarketPhase, MarketRegimeAlert};
use crate::domain::types::{Bar, Regime};
use crate::regime::follow_through::FtdState;
use chrono::NaiveDate;

/// Inputs for one day's regime computation. Bars must be ordered oldest
/// first with today's bar last.
pub struct RegimeInputs<'a> {
    pub date: NaiveDate,
    pub spy_bars: &'a [Bar],
    pub qqq_bars: &'a [Bar],
    pub es_change_pct: f64,
    pub nq_change_pct: f64,
    pub ym_change_pct: f64,
    pub fear_greed_score: Option<u8>,
    pub fear_greed_rating: Option<String>,
    pub vix_close: Option<f64>,
    pub spy_d_day_count: u32,
    pub qqq_d_day_count: u32,
    pub spy_d_count_5d_ago: u32,
    pub qqq_d_count_5d_ago: u32,
    pub ftd_state: &'a FtdState,
}

pub struct RegimeCalculator {
    config: MarketRegimeConfig,
}

impl RegimeCalculator {
    pub fn new(config: MarketRegimeConfig) -> Self {
        Self { config }
    }

    /// Compute the composite score and resulting `MarketRegimeAlert` for one
    /// trading day (spec §4.6).
    ///
    /// `entry_risk_score` pins an Open Question from the spec: it blends the
    /// D-Day pressure (60%) with the inverse of the composite score (40%),
    /// so a market can score "bullish" overall while still flagging elevated
    /// entry risk when distribution is building. See DESIGN.md.
    pub fn compute(&self, inputs: &RegimeInputs<'_>) -> MarketRegimeAlert {
        let ma_position_score = self.ma_position_score(inputs.spy_bars);
        let momentum_score = self.momentum_score(inputs);
        let d_day_penalty = self.config.weights.d_day_penalty_k
            * (inputs.spy_d_day_count + inputs.qqq_d_day_count) as f64;
        let ftd_term = if inputs.ftd_state.has_confirmed_ftd {
            self.config.weights.ftd_adjustment
        } else if inputs.ftd_state.phase == MarketPhase::Correction {
            -self.config.weights.ftd_adjustment
        } else {
            0.0
        };
        let fear_greed_term = match inputs.fear_greed_score {
            Some(score) if self.config.fear_greed_enabled => {
                self.config.weights.fear_greed * (score as f64 / 100.0)
            }
            _ => 0.0,
        };

        let composite_score = (self.config.weights.ma_position * ma_position_score
            + self.config.weights.momentum * momentum_score
            + fear_greed_term
            + ftd_term
            - d_day_penalty)
            .clamp(0.0, 1.0);

        let d_day_pressure = ((inputs.spy_d_day_count + inputs.qqq_d_day_count) as f64
            / (self.config.correction_d_day_threshold.max(1) as f64 * 2.0))
            .clamp(0.0, 1.0);
        let entry_risk_score = (d_day_pressure * 0.6 + (1.0 - composite_score) * 0.4).clamp(0.0, 1.0);

        let regime = if composite_score >= self.config.bullish_threshold {
            Regime::Bullish
        } else if composite_score >= self.config.neutral_threshold {
            Regime::Neutral
        } else {
            Regime::Bearish
        };

        let spy_5day_delta = inputs.spy_d_day_count as i32 - inputs.spy_d_count_5d_ago as i32;
        let qqq_5day_delta = inputs.qqq_d_day_count as i32 - inputs.qqq_d_count_5d_ago as i32;
        let d_day_trend = match (spy_5day_delta + qqq_5day_delta).signum() {
            -1 => DDayTrend::Improving,
            1 => DDayTrend::Worsening,
            _ => DDayTrend::Flat,
        };

        MarketRegimeAlert {
            date: inputs.date,
            composite_score,
            entry_risk_score,
            regime,
            spy_d_count: inputs.spy_d_day_count,
            qqq_d_count: inputs.qqq_d_day_count,
            spy_5day_delta,
            qqq_5day_delta,
            d_day_trend,
            market_phase: inputs.ftd_state.phase,
            rally_day: inputs.ftd_state.rally_day,
            has_confirmed_ftd: inputs.ftd_state.has_confirmed_ftd,
            es_change_pct: inputs.es_change_pct,
            nq_change_pct: inputs.nq_change_pct,
            ym_change_pct: inputs.ym_change_pct,
            fear_greed_score: inputs.fear_greed_score,
            fear_greed_rating: inputs.fear_greed_rating.clone(),
            vix_close: inputs.vix_close,
        }
    }

    /// 1.0 when the index closes above both its 50-day and 200-day moving
    /// averages, 0.5 above only one, 0.0 below both.
    fn ma_position_score(&self, bars: &[Bar]) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        if bars.len() < 200 {
            return 0.5;
        }
        let Some(last) = bars.last().and_then(|b| b.close.to_f64()) else {
            return 0.5;
        };
        let ma50 = crate::scoring::indicators::moving_average_series(bars, 50)
            .last()
            .copied()
            .unwrap_or(last);
        let ma200 = crate::scoring::indicators::moving_average_series(bars, 200)
            .last()
            .copied()
            .unwrap_or(last);

        match (last > ma50, last > ma200) {
            (true, true) => 1.0,
            (false, false) => 0.0,
            _ => 0.5,
        }
    }

    fn momentum_score(&self, inputs: &RegimeInputs<'_>) -> f64 {
        let futures_avg = (inputs.es_change_pct + inputs.nq_change_pct + inputs.ym_change_pct) / 3.0;
        (0.5 + futures_avg / 4.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: rust_decimal::Decimal) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000_000,
        }
    }

    #[test]
    fn bullish_when_above_both_averages_and_no_pressure() {
        let config = MarketRegimeConfig::default();
        let calculator = RegimeCalculator::new(config);
        let mut bars = vec![bar(1, dec!(100)); 199];
        bars.push(bar(200, dec!(120)));
        let ftd_state = FtdState {
            phase: MarketPhase::ConfirmedUptrend,
            has_confirmed_ftd: true,
            ..Default::default()
        };
        let inputs = RegimeInputs {
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            spy_bars: &bars,
            qqq_bars: &bars,
            es_change_pct: 0.5,
            nq_change_pct: 0.5,
            ym_change_pct: 0.5,
            fear_greed_score: Some(70),
            fear_greed_rating: Some("Greed".to_string()),
            vix_close: Some(14.0),
            spy_d_day_count: 0,
            qqq_d_day_count: 0,
            spy_d_count_5d_ago: 1,
            qqq_d_count_5d_ago: 1,
            ftd_state: &ftd_state,
        };
        let alert = calculator.compute(&inputs);
        assert_eq!(alert.regime, Regime::Bullish);
        assert_eq!(alert.d_day_trend, DDayTrend::Improving);
    }

    #[test]
    fn bearish_when_heavy_distribution_and_correction() {
        let config = MarketRegimeConfig::default();
        let calculator = RegimeCalculator::new(config);
        let bars = vec![bar(1, dec!(90))];
        let ftd_state = FtdState {
            phase: MarketPhase::Correction,
            ..Default::default()
        };
        let inputs = RegimeInputs {
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            spy_bars: &bars,
            qqq_bars: &bars,
            es_change_pct: -1.0,
            nq_change_pct: -1.0,
            ym_change_pct: -1.0,
            fear_greed_score: Some(15),
            fear_greed_rating: Some("ExtremeFear".to_string()),
            vix_close: Some(30.0),
            spy_d_day_count: 6,
            qqq_d_day_count: 6,
            spy_d_count_5d_ago: 2,
            qqq_d_count_5d_ago: 2,
            ftd_state: &ftd_state,
        };
        let alert = calculator.compute(&inputs);
        assert_eq!(alert.regime, Regime::Bearish);
        assert!(alert.entry_risk_score > 0.5);
    }
}
