//! `TP1` / `TP2` / `EIGHT_WEEK_HOLD` (spec §4.8 ProfitChecker).

use super::{snapshot, Checker};
use crate::config::Config;
use crate::domain::alert::AlertData;
use crate::domain::checker_context::PositionContext;
use crate::domain::types::{AlertSubtype, AlertType};

pub struct ProfitChecker;

impl Checker for ProfitChecker {
    fn name(&self) -> &'static str {
        "ProfitChecker"
    }

    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        let mut out = Vec::new();
        let cfg = &config.checkers.profit;

        if let Some(tp1) = ctx.tp1_target {
            if ctx.current_price >= tp1 {
                out.push(alert(ctx, AlertSubtype::Tp1, AlertType::Profit));
            }
        }
        if let Some(tp2) = ctx.tp2_target {
            if ctx.current_price >= tp2 {
                out.push(alert(ctx, AlertSubtype::Tp2, AlertType::Profit));
            }
        }

        if ctx.weeks_held >= cfg.eight_week_hold_weeks && ctx.pnl_pct >= cfg.eight_week_hold_gain_pct {
            out.push(alert(ctx, AlertSubtype::EightWeekHold, AlertType::Profit));
        }

        out
    }
}

fn alert(ctx: &PositionContext, subtype: AlertSubtype, alert_type: AlertType) -> AlertData {
    AlertData {
        position_id: Some(ctx.position_id),
        symbol: ctx.symbol.clone(),
        alert_type,
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

    fn base_ctx() -> PositionContext {
        PositionContext {
            symbol: "CRWD".to_string(),
            position_id: 7,
            state: 1.0,
            grade: Some(Grade::A),
            score: Some(15),
            market_regime: Some(Regime::Bullish),
            spy_price: None,
            current_price: dec!(130),
            avg_cost: dec!(100),
            pivot: None,
            original_pivot: None,
            stop_price: None,
            tp1_target: Some(dec!(120)),
            tp2_target: Some(dec!(140)),
            pnl_pct: 30.0,
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
            weeks_held: 9.0,
        }
    }

    #[test]
    fn fires_tp1_and_eight_week_hold_together() {
        let config = Config::default();
        let alerts = ProfitChecker.check(&base_ctx(), &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Tp1)));
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::EightWeekHold)));
        assert!(!alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Tp2)));
    }
}
