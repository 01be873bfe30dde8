//! `HARD_STOP` / `WARNING` / `TRAILING_STOP` (spec §4.8 StopChecker).

use super::{snapshot, Checker};
use crate::config::Config;
use crate::domain::alert::AlertData;
use crate::domain::checker_context::PositionContext;
use crate::domain::types::{AlertSubtype, AlertType};
use rust_decimal::Decimal;

pub struct StopChecker;

impl Checker for StopChecker {
    fn name(&self) -> &'static str {
        "StopChecker"
    }

    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        let mut out = Vec::new();
        let cfg = &config.checkers.stop;

        if let Some(stop_price) = ctx.stop_price {
            if ctx.current_price <= stop_price {
                out.push(alert(ctx, AlertSubtype::HardStop));
            } else {
                let warn_ceiling =
                    stop_price * (Decimal::ONE + Decimal::try_from(cfg.warn_pct_above_stop / 100.0).unwrap_or_default());
                if ctx.current_price <= warn_ceiling {
                    out.push(alert(ctx, AlertSubtype::Warning));
                }
            }
        }

        // Trailing stop only once the position has cleared TP1 (spec §4.8;
        // formula pinned in DESIGN.md — never below the hard stop or
        // avg_cost's minimum gain floor, and trails running_high without
        // ever moving down).
        if ctx.state >= cfg.trailing_active_from_state && ctx.avg_cost > Decimal::ZERO {
            let mut trailing_level =
                ctx.avg_cost * (Decimal::ONE + Decimal::try_from(cfg.trailing_min_gain_pct / 100.0).unwrap_or_default());
            if let Some(stop_price) = ctx.stop_price {
                trailing_level = trailing_level.max(stop_price);
            }
            if let Some(running_high) = ctx.running_high {
                let trail_floor = running_high
                    * (Decimal::ONE - Decimal::try_from(cfg.trailing_pct_below_high / 100.0).unwrap_or_default());
                trailing_level = trailing_level.max(trail_floor);
            }
            if ctx.current_price <= trailing_level {
                out.push(alert(ctx, AlertSubtype::TrailingStop));
            }
        }

        out
    }
}

fn alert(ctx: &PositionContext, subtype: AlertSubtype) -> AlertData {
    AlertData {
        position_id: Some(ctx.position_id),
        symbol: ctx.symbol.clone(),
        alert_type: AlertType::Stop,
        alert_subtype: subtype,
        snapshot: snapshot(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Grade, Regime};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn ctx(current_price: Decimal, stop_price: Option<Decimal>, state: f64, avg_cost: Decimal) -> PositionContext {
        PositionContext {
            symbol: "NVDA".to_string(),
            position_id: 1,
            state,
            grade: Some(Grade::B),
            score: Some(10),
            market_regime: Some(Regime::Bullish),
            spy_price: None,
            current_price,
            avg_cost,
            pivot: None,
            original_pivot: None,
            stop_price,
            tp1_target: None,
            tp2_target: None,
            pnl_pct: 0.0,
            ma_21: None,
            ma_50: None,
            ma_200: None,
            ma_10_week: None,
            volume_ratio: 1.0,
            rvol: 1.0,
            entry_date: None,
            earnings_date: None,
            now: Utc::now(),
            running_high: None,
            close_below_ma50_streak: 0,
            close_below_ma21_streak: 0,
            previously_extended: false,
            gap_up_pct: None,
            weeks_held: 0.0,
        }
    }

    #[test]
    fn fires_hard_stop_at_or_below_stop_price() {
        let config = Config::default();
        let position = ctx(dec!(95), Some(dec!(100)), 1.0, dec!(100));
        let alerts = StopChecker.check(&position, &config);
        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0].alert_subtype, AlertSubtype::HardStop));
    }

    #[test]
    fn fires_warning_just_above_stop() {
        let config = Config::default();
        let position = ctx(dec!(101), Some(dec!(100)), 1.0, dec!(100));
        let alerts = StopChecker.check(&position, &config);
        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0].alert_subtype, AlertSubtype::Warning));
    }

    #[test]
    fn no_alert_well_above_stop() {
        let config = Config::default();
        let position = ctx(dec!(120), Some(dec!(100)), 1.0, dec!(100));
        let alerts = StopChecker.check(&position, &config);
        assert!(alerts.is_empty());
    }
}
