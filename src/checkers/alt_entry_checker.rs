//! `21_EMA_BOUNCE` / `50_MA_BOUNCE` / `PIVOT_RETEST_AFTER_EXTENSION` (spec
//! §4.8 AltEntryChecker, watchlist/exited-watch only).

use super::{snapshot, Checker};
use crate::config::Config;
use crate::domain::alert::AlertData;
use crate::domain::checker_context::PositionContext;
use crate::domain::position::PositionState;
use crate::domain::types::{AlertSubtype, AlertType};
use rust_decimal::Decimal;

pub struct AltEntryChecker;

impl Checker for AltEntryChecker {
    fn name(&self) -> &'static str {
        "AltEntryChecker"
    }

    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        let is_watchlist = (ctx.state - PositionState::WATCHLIST.0).abs() < f64::EPSILON;
        let is_watching_exited = (ctx.state - PositionState::WATCHING_EXITED.0).abs() < f64::EPSILON;
        if !is_watchlist && !is_watching_exited {
            return Vec::new();
        }

        let mut out = Vec::new();
        let cfg = &config.checkers.alt_entry;

        if let Some(ma21) = ctx.ma_21 {
            if in_band(ctx.current_price, ma21, cfg.ema21_bounce_tolerance_pct) && ctx.current_price >= ma21 {
                out.push(alert(ctx, AlertSubtype::Ema21Bounce));
            }
        }

        if let Some(ma50) = ctx.ma_50 {
            if in_band(ctx.current_price, ma50, cfg.ma50_bounce_tolerance_pct) && ctx.current_price >= ma50 {
                out.push(alert(ctx, AlertSubtype::Ma50Bounce));
            }
        }

        if ctx.previously_extended {
            if let Some(original_pivot) = ctx.original_pivot {
                if in_band(ctx.current_price, original_pivot, cfg.pivot_retest_tolerance_pct) {
                    out.push(alert(ctx, AlertSubtype::PivotRetestAfterExtension));
                }
            }
        }

        out
    }
}

fn in_band(price: Decimal, level: Decimal, tolerance_pct: f64) -> bool {
    if level <= Decimal::ZERO {
        return false;
    }
    let tolerance = Decimal::try_from(tolerance_pct / 100.0).unwrap_or_default();
    let low = level * (Decimal::ONE - tolerance);
    let high = level * (Decimal::ONE + tolerance);
    price >= low && price <= high
}

fn alert(ctx: &PositionContext, subtype: AlertSubtype) -> AlertData {
    AlertData {
        position_id: Some(ctx.position_id),
        symbol: ctx.symbol.clone(),
        alert_type: AlertType::AltEntry,
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

    fn ctx(state: f64, current_price: Decimal, ma21: Option<Decimal>, previously_extended: bool, original_pivot: Option<Decimal>) -> PositionContext {
        PositionContext {
            symbol: "NET".to_string(),
            position_id: 11,
            state,
            grade: Some(Grade::B),
            score: Some(8),
            market_regime: Some(Regime::Bullish),
            spy_price: None,
            current_price,
            avg_cost: Decimal::ZERO,
            pivot: None,
            original_pivot,
            stop_price: None,
            tp1_target: None,
            tp2_target: None,
            pnl_pct: 0.0,
            ma_21: ma21,
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
            previously_extended,
            gap_up_pct: None,
            weeks_held: 0.0,
        }
    }

    #[test]
    fn bounce_on_watchlist_near_21_ema() {
        let config = Config::default();
        let position = ctx(0.0, dec!(100.5), Some(dec!(100)), false, None);
        let alerts = AltEntryChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Ema21Bounce)));
    }

    #[test]
    fn pivot_retest_after_extension_when_flagged() {
        let config = Config::default();
        let position = ctx(-1.5, dec!(100.5), None, true, Some(dec!(100)));
        let alerts = AltEntryChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::PivotRetestAfterExtension)));
    }

    #[test]
    fn no_alerts_for_active_positions() {
        let config = Config::default();
        let position = ctx(2.0, dec!(100.5), Some(dec!(100)), false, None);
        let alerts = AltEntryChecker.check(&position, &config);
        assert!(alerts.is_empty());
    }
}
