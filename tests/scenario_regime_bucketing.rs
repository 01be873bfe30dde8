//! Scenario S4: regime bucketing under D-Day pressure (spec §8 "S4 —
//! Regime bucketing").

use canslim_monitor::config::MarketRegimeConfig;
use canslim_monitor::domain::market_regime::{DDayTrend, MarketPhase};
use canslim_monitor::domain::types::{Bar, Regime};
use canslim_monitor::regime::follow_through::FtdState;
use canslim_monitor::regime::{RegimeCalculator, RegimeInputs};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn bar(date: NaiveDate, close: rust_decimal::Decimal) -> Bar {
    Bar { date, open: close, high: close, low: close, close, volume: 1_000_000 }
}

#[test]
fn worsening_d_day_pressure_and_weak_futures_bucket_bearish() {
    let config = MarketRegimeConfig::default();
    let calculator = RegimeCalculator::new(config);
    let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
    let spy_bars = vec![bar(today - chrono::Duration::days(1), dec!(450)), bar(today, dec!(448))];
    let qqq_bars = vec![bar(today - chrono::Duration::days(1), dec!(380)), bar(today, dec!(378))];

    let ftd_state = FtdState { phase: MarketPhase::UptrendUnderPressure, ..FtdState::default() };

    let inputs = RegimeInputs {
        date: today,
        spy_bars: &spy_bars,
        qqq_bars: &qqq_bars,
        es_change_pct: -1.0,
        nq_change_pct: -1.0,
        ym_change_pct: -1.0,
        fear_greed_score: Some(18),
        fear_greed_rating: Some("ExtremeFear".to_string()),
        vix_close: None,
        spy_d_day_count: 6,
        qqq_d_day_count: 3,
        spy_d_count_5d_ago: 4,
        qqq_d_count_5d_ago: 3,
        ftd_state: &ftd_state,
    };

    let alert = calculator.compute(&inputs);

    assert!(alert.composite_score < 0.5, "composite_score was {}", alert.composite_score);
    assert_eq!(alert.regime, Regime::Bearish);
    assert_eq!(alert.d_day_trend, DDayTrend::Worsening);
    assert!(matches!(alert.market_phase, MarketPhase::UptrendUnderPressure | MarketPhase::Correction));
}
