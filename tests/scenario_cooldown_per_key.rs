//! Scenario S6: cooldown is keyed by (symbol, alert_type, alert_subtype),
//! not by symbol alone (spec §8 "S6 — Cooldown per (symbol,type,subtype)").

use async_trait::async_trait;
use canslim_monitor::alerts::AlertService;
use canslim_monitor::config::AlertsConfig;
use canslim_monitor::domain::alert::{Alert, AlertData, AlertSnapshot};
use canslim_monitor::domain::errors::{ProviderError, RepositoryError};
use canslim_monitor::domain::ports::Notifier;
use canslim_monitor::domain::repositories::AlertRepository;
use canslim_monitor::domain::types::{AlertSubtype, AlertType};
use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Mutex;

struct MemoryAlertRepo {
    rows: Mutex<Vec<Alert>>,
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

struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _channel: &str, _subject: &str, _body: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

fn data(position_id: i64, symbol: &str, alert_type: AlertType, alert_subtype: AlertSubtype) -> AlertData {
    AlertData {
        position_id: Some(position_id),
        symbol: symbol.to_string(),
        alert_type,
        alert_subtype,
        snapshot: AlertSnapshot {
            price: dec!(100),
            pivot_at_alert: None,
            avg_cost_at_alert: dec!(100),
            pnl_pct_at_alert: 0.0,
            volume_ratio: 1.0,
            ma21: None,
            ma50: None,
            grade: None,
            score: None,
            market_regime: None,
            state_at_alert: 1.0,
        },
    }
}

#[tokio::test]
async fn cooldown_is_scoped_to_symbol_type_and_subtype() {
    let repo = MemoryAlertRepo { rows: Mutex::new(Vec::new()) };
    let notifier = NullNotifier;
    let config = AlertsConfig::default();
    let service = AlertService::new(&repo, &notifier, &config, None);

    let t0 = Utc::now();
    let aapl_warning = service
        .emit(data(1, "AAPL", AlertType::Stop, AlertSubtype::Warning), t0)
        .await
        .unwrap();
    assert!(aapl_warning.is_some());

    // Same (symbol, type, subtype) within the cooldown window: suppressed.
    let aapl_warning_repeat = service
        .emit(data(1, "AAPL", AlertType::Stop, AlertSubtype::Warning), t0 + chrono::Duration::minutes(10))
        .await
        .unwrap();
    assert!(aapl_warning_repeat.is_none());

    // Same symbol and type, different subtype: emitted.
    let aapl_hard_stop = service
        .emit(data(1, "AAPL", AlertType::Stop, AlertSubtype::HardStop), t0 + chrono::Duration::minutes(10))
        .await
        .unwrap();
    assert!(aapl_hard_stop.is_some());

    // Different symbol (different position_id), same type/subtype: emitted.
    let msft_warning = service
        .emit(data(2, "MSFT", AlertType::Stop, AlertSubtype::Warning), t0 + chrono::Duration::minutes(10))
        .await
        .unwrap();
    assert!(msft_warning.is_some());
}
