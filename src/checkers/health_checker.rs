//! `CRITICAL` / `EARNINGS` / `LATE_STAGE` (spec §4.8 HealthChecker).

use super::{snapshot, Checker};
use crate::config::Config;
use crate::domain::alert::AlertData;
use crate::domain::checker_context::PositionContext;
use crate::domain::types::{AlertSubtype, AlertType, Grade};

pub struct HealthChecker;

impl Checker for HealthChecker {
    fn name(&self) -> &'static str {
        "HealthChecker"
    }

    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        let mut out = Vec::new();
        let cfg = &config.checkers.health;

        if composite_health_score(ctx) < cfg.critical_score_threshold {
            out.push(alert(ctx, AlertSubtype::Critical));
        }

        if let Some(earnings_date) = ctx.earnings_date {
            let days_out = (earnings_date - ctx.now.date_naive()).num_days();
            if days_out >= 0 && days_out <= config.earnings.warning_caution_days {
                out.push(alert(ctx, AlertSubtype::Earnings));
            }
        }

        // `PositionContext` doesn't carry chart base-stage (spec's context
        // field list omits it); time-in-position alone stands in for "late
        // stage" here.
        if ctx.weeks_held >= cfg.late_stage_max_weeks_held {
            out.push(alert(ctx, AlertSubtype::LateStage));
        }

        out
    }
}

/// Aggregates PnL, MA stack, RS grade, and volume into a single 0..100
/// score (spec §4.8 "aggregates PnL, MA stack, RS, volume").
fn composite_health_score(ctx: &PositionContext) -> f64 {
    let mut score = 50.0;
    score += ctx.pnl_pct.clamp(-40.0, 40.0) * 0.5;

    let ma_stack_count = [ctx.ma_21, ctx.ma_50, ctx.ma_200]
        .iter()
        .filter(|ma| ma.map(|m| ctx.current_price > m).unwrap_or(false))
        .count();
    score += (ma_stack_count as f64 - 1.5) * 10.0;

    if let Some(grade) = ctx.grade {
        score += match grade {
            Grade::APlus | Grade::A => 15.0,
            Grade::BPlus | Grade::B => 5.0,
            Grade::CPlus | Grade::C => -5.0,
            Grade::D | Grade::F => -20.0,
        };
    }

    score += (ctx.volume_ratio - 1.0).clamp(-1.0, 1.0) * 10.0;

    score.clamp(0.0, 100.0)
}

fn alert(ctx: &PositionContext, subtype: AlertSubtype) -> AlertData {
    AlertData {
        position_id: Some(ctx.position_id),
        symbol: ctx.symbol.clone(),
        alert_type: AlertType::Health,
        alert_subtype: subtype,
        snapshot: snapshot(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Regime;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn ctx(pnl_pct: f64, grade: Grade, earnings_in_days: Option<i64>, weeks_held: f64) -> PositionContext {
        let now = Utc::now();
        PositionContext {
            symbol: "AMD".to_string(),
            position_id: 5,
            state: 2.0,
            grade: Some(grade),
            score: Some(5),
            market_regime: Some(Regime::Neutral),
            spy_price: None,
            current_price: dec!(90),
            avg_cost: dec!(100),
            pivot: None,
            original_pivot: None,
            stop_price: None,
            tp1_target: None,
            tp2_target: None,
            pnl_pct,
            ma_21: Some(dec!(95)),
            ma_50: Some(dec!(98)),
            ma_200: Some(dec!(100)),
            ma_10_week: None,
            volume_ratio: 1.0,
            rvol: 1.0,
            entry_date: None,
            earnings_date: earnings_in_days.map(|d| now.date_naive() + Duration::days(d)),
            now,
            running_high: None,
            close_below_ma50_streak: 0,
            close_below_ma21_streak: 0,
            previously_extended: false,
            gap_up_pct: None,
            weeks_held,
        }
    }

    #[test]
    fn critical_on_poor_composite_health() {
        let config = Config::default();
        let position = ctx(-30.0, Grade::F, None, 2.0);
        let alerts = HealthChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Critical)));
    }

    #[test]
    fn earnings_alert_within_critical_window() {
        let config = Config::default();
        let position = ctx(5.0, Grade::A, Some(3), 2.0);
        let alerts = HealthChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Earnings)));
    }

    #[test]
    fn late_stage_after_holding_too_long() {
        let config = Config::default();
        let position = ctx(10.0, Grade::A, None, 30.0);
        let alerts = HealthChecker.check(&position, &config);
        assert!(alerts.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::LateStage)));
    }
}
