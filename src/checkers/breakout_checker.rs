//! `APPROACHING` / `CONFIRMED` / `IN_BUY_ZONE` / `EXTENDED` / `SUPPRESSED`
//! (spec §4.8 BreakoutChecker, watchlist-only).

use super::{snapshot, Checker};
use crate::config::Config;
use crate::domain::alert::AlertData;
use crate::domain::checker_context::PositionContext;
use crate::domain::position::PositionState;
use crate::domain::types::{AlertSubtype, AlertType, Grade, Regime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub struct BreakoutChecker;

impl Checker for BreakoutChecker {
    fn name(&self) -> &'static str {
        "BreakoutChecker"
    }

    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        if (ctx.state - PositionState::WATCHLIST.0).abs() > f64::EPSILON {
            return Vec::new();
        }
        let Some(pivot) = ctx.pivot else {
            return Vec::new();
        };
        if pivot <= Decimal::ZERO {
            return Vec::new();
        }

        let cfg = &config.checkers.breakout;
        let pct_from_pivot = ((ctx.current_price - pivot) / pivot * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0);

        let extended_ceiling = pivot * (Decimal::ONE + Decimal::try_from(cfg.extended_pct / 100.0).unwrap_or_default());
        let buy_zone_ceiling =
            pivot * (Decimal::ONE + Decimal::try_from(cfg.buy_zone_upper_pct / 100.0).unwrap_or_default());

        if ctx.current_price > extended_ceiling {
            return vec![alert(ctx, AlertSubtype::Extended)];
        }

        let confirmed = ctx.current_price > pivot && ctx.rvol >= cfg.volume_confirmation;
        if confirmed {
            if suppressed(ctx) {
                return vec![alert(ctx, AlertSubtype::Suppressed)];
            }
            return vec![alert(ctx, AlertSubtype::Confirmed)];
        }

        if ctx.current_price >= pivot && ctx.current_price <= buy_zone_ceiling {
            return vec![alert(ctx, AlertSubtype::InBuyZone)];
        }

        if pct_from_pivot < 0.0 && pct_from_pivot >= -cfg.approaching_pct {
            return vec![alert(ctx, AlertSubtype::Approaching)];
        }

        Vec::new()
    }
}

/// Entry conditions are met but the broader market or the stock's own grade
/// floor argues against chasing (spec §4.8 "market regime or grade floor
/// suppresses the signal").
fn suppressed(ctx: &PositionContext) -> bool {
    let regime_bearish = matches!(ctx.market_regime, Some(Regime::Bearish));
    let grade_too_low = matches!(ctx.grade, None | Some(Grade::D) | Some(Grade::F));
    regime_bearish || grade_too_low
}

fn alert(ctx: &PositionContext, subtype: AlertSubtype) -> AlertData {
    AlertData {
        position_id: Some(ctx.position_id),
        symbol: ctx.symbol.clone(),
        alert_type: AlertType::Breakout,
        alert_subtype: subtype,
        snapshot: snapshot(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn ctx(current_price: Decimal, pivot: Decimal, rvol: f64, regime: Regime, grade: Option<Grade>) -> PositionContext {
        PositionContext {
            symbol: "PLTR".to_string(),
            position_id: 9,
            state: 0.0,
            grade,
            score: Some(12),
            market_regime: Some(regime),
            spy_price: None,
            current_price,
            avg_cost: Decimal::ZERO,
            pivot: Some(pivot),
            original_pivot: Some(pivot),
            stop_price: None,
            tp1_target: None,
            tp2_target: None,
            pnl_pct: 0.0,
            ma_21: None,
            ma_50: None,
            ma_200: None,
            ma_10_week: None,
            volume_ratio: rvol,
            rvol,
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
    fn confirmed_on_breakout_with_volume() {
        let config = Config::default();
        let position = ctx(dec!(101), dec!(100), 1.6, Regime::Bullish, Some(Grade::A));
        let alerts = BreakoutChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Confirmed)));
    }

    #[test]
    fn suppressed_when_regime_bearish() {
        let config = Config::default();
        let position = ctx(dec!(101), dec!(100), 1.6, Regime::Bearish, Some(Grade::A));
        let alerts = BreakoutChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Suppressed)));
    }

    #[test]
    fn extended_well_above_pivot() {
        let config = Config::default();
        let position = ctx(dec!(110), dec!(100), 1.0, Regime::Bullish, Some(Grade::A));
        let alerts = BreakoutChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Extended)));
    }
}
