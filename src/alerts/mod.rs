//! `AlertService`: the value-added layer over the alerts repository (spec
//! §4.7). Applies cooldown policy, persists, and routes to the notifier.

use crate::config::AlertsConfig;
use crate::domain::alert::{Alert, AlertData};
use crate::domain::errors::RepositoryError;
use crate::domain::ports::Notifier;
use crate::domain::repositories::AlertRepository;
use crate::domain::types::Severity;
use crate::infrastructure::observability::Metrics;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub struct AlertService<'a> {
    repo: &'a dyn AlertRepository,
    notifier: &'a dyn Notifier,
    config: &'a AlertsConfig,
    metrics: Option<&'a Metrics>,
}

impl<'a> AlertService<'a> {
    pub fn new(repo: &'a dyn AlertRepository, notifier: &'a dyn Notifier, config: &'a AlertsConfig, metrics: Option<&'a Metrics>) -> Self {
        Self { repo, notifier, config, metrics }
    }

    /// Validate, apply the cooldown policy, persist, and enqueue for
    /// notification (spec §4.7 `emit`). Returns `Ok(None)` when suppressed
    /// by cooldown rather than an error — cooldown is routine, not a fault.
    pub async fn emit(&self, data: AlertData, now: DateTime<Utc>) -> Result<Option<Alert>, RepositoryError> {
        if self.is_in_cooldown(&data, now).await? {
            info!(symbol = %data.symbol, alert_type = %data.alert_type, alert_subtype = %data.alert_subtype, "alert suppressed by cooldown");
            return Ok(None);
        }

        let severity = data.severity();
        let alert = Alert {
            id: 0,
            position_id: data.position_id,
            symbol: data.symbol.clone(),
            alert_type: data.alert_type,
            alert_subtype: data.alert_subtype,
            severity,
            snapshot: data.snapshot,
            alert_time: now,
            acknowledged: false,
            notified_channels: Vec::new(),
        };
        let inserted = self.repo.insert(alert).await?;
        if let Some(metrics) = self.metrics {
            metrics.inc_alert(&severity.to_string());
        }

        let subject = format!("{} {} {}", inserted.symbol, inserted.alert_type, inserted.alert_subtype);
        let body = serde_json::to_string(&inserted.snapshot).unwrap_or_default();
        if let Err(e) = self.notifier.notify("default", &subject, &body).await {
            warn!(symbol = %inserted.symbol, error = %e, "notification delivery failed");
        }

        Ok(Some(inserted))
    }

    /// Pure (type, subtype) -> severity lookup (spec §4.7 `severity`).
    pub fn severity(&self, alert_type: crate::domain::types::AlertType, alert_subtype: crate::domain::types::AlertSubtype) -> Severity {
        crate::domain::alert::severity_of(alert_type, alert_subtype)
    }

    pub async fn latest_for_position(&self, position_id: i64, limit: u32) -> Result<Vec<Alert>, RepositoryError> {
        self.repo.latest_for_position(position_id, limit).await
    }

    pub async fn latest_for_symbols(&self, symbols: &[String], limit: u32) -> Result<Vec<Alert>, RepositoryError> {
        self.repo.latest_for_symbols(symbols, limit).await
    }

    pub async fn acknowledge(&self, alert_id: i64) -> Result<(), RepositoryError> {
        self.repo.acknowledge(alert_id).await
    }

    /// Per-(symbol, type, subtype) suppression window, default 30 minutes,
    /// configurable per rule family (spec §4.7 "Cooldown").
    async fn is_in_cooldown(&self, data: &AlertData, now: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let Some(position_id) = data.position_id else {
            return Ok(false);
        };
        let alert_type = data.alert_type.to_string();
        let alert_subtype = data.alert_subtype.to_string();
        let minutes = self.config.cooldown_for(&alert_type, &alert_subtype);
        if minutes <= 0 {
            return Ok(false);
        }
        let latest = self.repo.latest_of_kind(position_id, &alert_type, &alert_subtype).await?;
        Ok(match latest {
            Some(prev) => now.signed_duration_since(prev.alert_time) < chrono::Duration::minutes(minutes),
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::AlertSnapshot;
    use crate::domain::errors::ProviderError;
    use crate::domain::types::{AlertSubtype, AlertType};
    use async_trait::async_trait;
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
        async fn acknowledge(&self, id: i64) -> Result<(), RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|a| a.id == id) {
                row.acknowledged = true;
            }
            Ok(())
        }
        async fn latest_of_kind(
            &self,
            position_id: i64,
            alert_type: &str,
            alert_subtype: &str,
        ) -> Result<Option<Alert>, RepositoryError> {
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

    fn sample_alert_data() -> AlertData {
        AlertData {
            position_id: Some(1),
            symbol: "NVDA".to_string(),
            alert_type: AlertType::Stop,
            alert_subtype: AlertSubtype::HardStop,
            snapshot: AlertSnapshot {
                price: dec!(95),
                pivot_at_alert: None,
                avg_cost_at_alert: dec!(100),
                pnl_pct_at_alert: -5.0,
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
    async fn emits_and_persists_a_new_alert() {
        let repo = MemoryAlertRepo { rows: Mutex::new(Vec::new()) };
        let notifier = NullNotifier;
        let config = AlertsConfig::default();
        let service = AlertService::new(&repo, &notifier, &config, None);

        let result = service.emit(sample_alert_data(), Utc::now()).await.unwrap();
        assert!(result.is_some());
        assert_eq!(repo.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn suppresses_duplicate_within_cooldown_window() {
        let repo = MemoryAlertRepo { rows: Mutex::new(Vec::new()) };
        let notifier = NullNotifier;
        let config = AlertsConfig::default();
        let service = AlertService::new(&repo, &notifier, &config, None);

        let now = Utc::now();
        service.emit(sample_alert_data(), now).await.unwrap();
        let second = service.emit(sample_alert_data(), now + chrono::Duration::minutes(5)).await.unwrap();
        assert!(second.is_none());
        assert_eq!(repo.rows.lock().unwrap().len(), 1);
    }
}
