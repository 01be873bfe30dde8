//! Scenario S1: breakout confirmation, then cooldown-suppressed repeat
//! (spec §8 "S1 — Breakout confirmation").

use async_trait::async_trait;
use canslim_monitor::checkers::CheckerSuite;
use canslim_monitor::config::Config;
use canslim_monitor::domain::alert::Alert;
use canslim_monitor::domain::checker_context::PositionContext;
use canslim_monitor::domain::errors::RepositoryError;
use canslim_monitor::domain::position::PositionState;
use canslim_monitor::domain::repositories::AlertRepository;
use canslim_monitor::domain::types::{AlertSubtype, Grade, Regime};
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Mutex;

struct MemoryAlertRepo {
    rows: Mutex<Vec<Alert>>,
}

impl MemoryAlertRepo {
    fn new() -> Self {
        Self { rows: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl AlertRepository for MemoryAlertRepo {
    async fn insert(&self, mut alert: Alert) -> Result<Alert, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        alert.id = rows.len() as i64 + 1;
        rows.push(alert.clone());
        Ok(alert)
    }
    async fn latest_for_position(&self, _position_id: i64, _limit: u32) -> Result<Vec<Alert>, RepositoryError> {
        Ok(self.rows.lock().unwrap().clone())
    }
    async fn latest_for_symbols(&self, _symbols: &[String], _limit: u32) -> Result<Vec<Alert>, RepositoryError> {
        Ok(self.rows.lock().unwrap().clone())
    }
    async fn acknowledge(&self, _id: i64) -> Result<(), RepositoryError> {
        Ok(())
    }
    async fn latest_of_kind(&self, position_id: i64, alert_type: &str, alert_subtype: &str) -> Result<Option<Alert>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.position_id == Some(position_id) && a.alert_type.to_string() == alert_type && a.alert_subtype.to_string() == alert_subtype)
            .max_by_key(|a| a.alert_time)
            .cloned())
    }
}

fn nvda_watchlist_ctx(now: chrono::DateTime<Utc>) -> PositionContext {
    PositionContext {
        symbol: "NVDA".to_string(),
        position_id: 1,
        state: PositionState::WATCHLIST.0,
        grade: Some(Grade::B),
        score: Some(18),
        market_regime: Some(Regime::Bullish),
        spy_price: None,
        current_price: dec!(142.50),
        avg_cost: rust_decimal::Decimal::ZERO,
        pivot: Some(dec!(140.00)),
        original_pivot: Some(dec!(140.00)),
        stop_price: None,
        tp1_target: None,
        tp2_target: None,
        pnl_pct: 0.0,
        ma_21: None,
        ma_50: None,
        ma_200: None,
        ma_10_week: None,
        volume_ratio: 2.1,
        rvol: 2.1,
        entry_date: None,
        earnings_date: None,
        now,
        running_high: None,
        close_below_ma50_streak: 0,
        close_below_ma21_streak: 0,
        previously_extended: false,
        gap_up_pct: None,
        weeks_held: 0.0,
    }
}

#[tokio::test]
async fn breakout_confirms_then_suppresses_the_repeat_within_cooldown() {
    let config = Config::default();
    let alert_repo = MemoryAlertRepo::new();
    let suite = CheckerSuite::breakout_suite();

    let t0 = Utc::now();
    let ctx = nvda_watchlist_ctx(t0);
    let first = suite.evaluate(&ctx, &config, &alert_repo).await;
    assert!(first.iter().any(|a| matches!(a.alert_subtype, AlertSubtype::Confirmed)));

    alert_repo
        .insert(canslim_monitor::domain::alert::Alert {
            id: 0,
            position_id: Some(1),
            symbol: "NVDA".to_string(),
            alert_type: first[0].alert_type,
            alert_subtype: first[0].alert_subtype,
            severity: first[0].severity(),
            snapshot: first[0].snapshot.clone(),
            alert_time: t0,
            acknowledged: false,
            notified_channels: Vec::new(),
        })
        .await
        .unwrap();

    let ctx_again = nvda_watchlist_ctx(t0 + chrono::Duration::minutes(5));
    let second = suite.evaluate(&ctx_again, &config, &alert_repo).await;
    assert!(
        second.is_empty(),
        "a second identical confirmed breakout within the cooldown window must be suppressed"
    );
}
