//! `P1_READY` / `P1_EXTENDED` / `P2_READY` / `P2_EXTENDED` / `PULLBACK`
//! (spec §4.8 PyramidChecker).

use super::{snapshot, Checker};
use crate::config::Config;
use crate::domain::alert::AlertData;
use crate::domain::checker_context::PositionContext;
use crate::domain::position::PositionState;
use crate::domain::types::{AlertSubtype, AlertType};
use rust_decimal::Decimal;

pub struct PyramidChecker;

impl Checker for PyramidChecker {
    fn name(&self) -> &'static str {
        "PyramidChecker"
    }

    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        let mut out = Vec::new();
        let cfg = &config.checkers.pyramid;

        if ctx.avg_cost > Decimal::ZERO {
            let lower = ctx.avg_cost * (Decimal::ONE + Decimal::try_from(cfg.zone_lower_pct / 100.0).unwrap_or_default());
            let upper = ctx.avg_cost * (Decimal::ONE + Decimal::try_from(cfg.zone_upper_pct / 100.0).unwrap_or_default());

            if (ctx.state - PositionState::ENTRY1.0).abs() < f64::EPSILON {
                if ctx.current_price > upper {
                    out.push(alert(ctx, AlertSubtype::P1Extended));
                } else if ctx.current_price >= lower {
                    out.push(alert(ctx, AlertSubtype::P1Ready));
                }
            } else if (ctx.state - PositionState::ENTRY2.0).abs() < f64::EPSILON {
                if ctx.current_price > upper {
                    out.push(alert(ctx, AlertSubtype::P2Extended));
                } else if ctx.current_price >= lower {
                    out.push(alert(ctx, AlertSubtype::P2Ready));
                }
            }
        }

        if ctx.state >= PositionState::ENTRY1.0 && ctx.previously_extended {
            if let Some(ma21) = ctx.ma_21 {
                let tolerance = Decimal::try_from(cfg.pullback_to_ma21_tolerance_pct / 100.0).unwrap_or_default();
                let band_low = ma21 * (Decimal::ONE - tolerance);
                let band_high = ma21 * (Decimal::ONE + tolerance);
                if ctx.current_price >= band_low && ctx.current_price <= band_high && ctx.volume_ratio >= 1.0 {
                    out.push(alert(ctx, AlertSubtype::Pullback));
                }
            }
        }

        out
    }
}

fn alert(ctx: &PositionContext, subtype: AlertSubtype) -> AlertData {
    AlertData {
        position_id: Some(ctx.position_id),
        symbol: ctx.symbol.clone(),
        alert_type: AlertType::Pyramid,
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

    fn ctx(state: f64, current_price: Decimal, avg_cost: Decimal) -> PositionContext {
        PositionContext {
            symbol: "SHOP".to_string(),
            position_id: 3,
            state,
            grade: Some(Grade::B),
            score: Some(10),
            market_regime: Some(Regime::Bullish),
            spy_price: None,
            current_price,
            avg_cost,
            pivot: None,
            original_pivot: None,
            stop_price: None,
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
    fn p1_ready_in_add_on_zone() {
        let config = Config::default();
        let position = ctx(1.0, dec!(102.5), dec!(100));
        let alerts = PyramidChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::P1Ready)));
    }

    #[test]
    fn p1_extended_above_zone() {
        let config = Config::default();
        let position = ctx(1.0, dec!(110), dec!(100));
        let alerts = PyramidChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::P1Extended)));
    }
}
