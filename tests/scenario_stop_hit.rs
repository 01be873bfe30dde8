//! Scenario S2: a hard-stop breach (spec §8 "S2 — Stop hit").

use canslim_monitor::checkers::{Checker, StopChecker};
use canslim_monitor::config::Config;
use canslim_monitor::domain::checker_context::PositionContext;
use canslim_monitor::domain::types::{AlertSubtype, AlertType, Grade, Regime, Severity};
use chrono::Utc;
use rust_decimal_macros::dec;

fn amd_position(current_price: rust_decimal::Decimal) -> PositionContext {
    let avg_cost = dec!(100);
    use rust_decimal::prelude::ToPrimitive;
    let pnl_pct = ((current_price - avg_cost) / avg_cost * rust_decimal::Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap();
    PositionContext {
        symbol: "AMD".to_string(),
        position_id: 2,
        state: 1.0,
        grade: Some(Grade::B),
        score: Some(10),
        market_regime: Some(Regime::Neutral),
        spy_price: None,
        current_price,
        avg_cost,
        pivot: None,
        original_pivot: None,
        stop_price: Some(dec!(93)),
        tp1_target: None,
        tp2_target: None,
        pnl_pct,
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
        weeks_held: 2.0,
    }
}

#[test]
fn hard_stop_breach_emits_critical_alert_with_expected_pnl() {
    let config = Config::default();
    let ctx = amd_position(dec!(92.50));

    let alerts = StopChecker.check(&ctx, &config);
    let hard_stop = alerts
        .iter()
        .find(|a| matches!(a.alert_subtype, AlertSubtype::HardStop))
        .expect("expected a HARD_STOP alert");

    assert_eq!(hard_stop.alert_type, AlertType::Stop);
    assert_eq!(hard_stop.severity(), Severity::Critical);
    assert!(
        (hard_stop.snapshot.pnl_pct_at_alert - (-7.5)).abs() < 0.01,
        "expected pnl_pct ~= -7.5%, got {}",
        hard_stop.snapshot.pnl_pct_at_alert
    );
}
