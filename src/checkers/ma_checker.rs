//! `MA_50_WARNING` / `MA_50_SELL` / `EMA_21_SELL` / `TEN_WEEK_SELL` /
//! `CLIMAX_TOP` (spec §4.8 MAChecker).

use super::{snapshot, Checker};
use crate::config::Config;
use crate::domain::alert::AlertData;
use crate::domain::checker_context::PositionContext;
use crate::domain::types::{AlertSubtype, AlertType};
use rust_decimal::prelude::ToPrimitive;

pub struct MaChecker;

impl Checker for MaChecker {
    fn name(&self) -> &'static str {
        "MAChecker"
    }

    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        let mut out = Vec::new();
        let cfg = &config.checkers.ma;

        if let Some(ma50) = ctx.ma_50.and_then(|v| v.to_f64()) {
            if ma50 > 0.0 {
                let price = ctx.current_price.to_f64().unwrap_or(0.0);
                let pct_from_ma50 = ((price - ma50) / ma50 * 100.0).abs();

                if ctx.close_below_ma50_streak >= 1 && ctx.volume_ratio > 1.0 {
                    out.push(alert(ctx, AlertSubtype::Ma50Sell, AlertType::Technical));
                } else if pct_from_ma50 <= cfg.ma50_warning_pct {
                    out.push(alert(ctx, AlertSubtype::Ma50Warning, AlertType::Technical));
                }
            }
        }

        if ctx.close_below_ma21_streak >= cfg.ema21_sell_consecutive_days {
            out.push(alert(ctx, AlertSubtype::Ema21Sell, AlertType::Technical));
        }

        if let Some(ma10w) = ctx.ma_10_week {
            if ctx.current_price < ma10w && ctx.volume_ratio >= cfg.ten_week_sell_volume_ratio {
                out.push(alert(ctx, AlertSubtype::TenWeekSell, AlertType::Technical));
            }
        }

        if let Some(gap) = ctx.gap_up_pct {
            if gap >= cfg.climax_top_gap_pct
                && ctx.pnl_pct >= cfg.climax_top_run_up_pct
                && ctx.volume_ratio >= cfg.climax_top_volume_ratio
            {
                out.push(alert(ctx, AlertSubtype::ClimaxTop, AlertType::Technical));
            }
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
            symbol: "TSLA".to_string(),
            position_id: 4,
            state: 2.0,
            grade: Some(Grade::B),
            score: Some(9),
            market_regime: Some(Regime::Neutral),
            spy_price: None,
            current_price: dec!(95),
            avg_cost: dec!(100),
            pivot: None,
            original_pivot: None,
            stop_price: None,
            tp1_target: None,
            tp2_target: None,
            pnl_pct: -5.0,
            ma_21: None,
            ma_50: Some(dec!(100)),
            ma_200: None,
            ma_10_week: Some(dec!(90)),
            volume_ratio: 1.5,
            rvol: 1.5,
            entry_date: None,
            earnings_date: None,
            now: Utc::now(),
            running_high: None,
            close_below_ma50_streak: 1,
            close_below_ma21_streak: 0,
            previously_extended: false,
            gap_up_pct: None,
            weeks_held: 3.0,
        }
    }

    #[test]
    fn ma50_sell_on_close_below_with_volume() {
        let config = Config::default();
        let alerts = MaChecker.check(&base_ctx(), &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Ma50Sell)));
    }

    #[test]
    fn ten_week_sell_below_ma_on_volume() {
        let config = Config::default();
        let mut position = base_ctx();
        position.current_price = dec!(85);
        let alerts = MaChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::TenWeekSell)));
    }
}
