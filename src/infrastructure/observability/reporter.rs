//! Push-based metrics reporter.
//!
//! Periodically outputs metrics as structured JSON to stdout and updates the
//! Prometheus registry in `Metrics`.
//!
//! **Security**: This system only SENDS data, never accepts requests.

use crate::domain::position::PositionState;
use crate::domain::repositories::{PositionRepository, RegimeRepository};
use crate::infrastructure::observability::metrics::Metrics;
use crate::supervisor::Supervisor;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Metrics snapshot for JSON output.
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub positions: PositionsSnapshot,
    pub regime: Option<RegimeSnapshot>,
    pub workers: Vec<WorkerSnapshot>,
}

#[derive(Serialize)]
pub struct PositionsSnapshot {
    pub total: usize,
    pub by_state: Vec<(String, usize)>,
}

#[derive(Serialize)]
pub struct RegimeSnapshot {
    pub date: String,
    pub composite_score: f64,
    pub entry_risk_score: f64,
    pub regime: String,
}

#[derive(Serialize)]
pub struct WorkerSnapshot {
    pub name: String,
    pub state: String,
    pub messages_processed: u64,
    pub errors: u64,
}

fn state_label(state: PositionState) -> &'static str {
    match state {
        PositionState::STOPPED_OUT => "stopped_out",
        PositionState::MANUAL_EXIT => "manual_exit",
        PositionState::WATCHING_EXITED => "watching_exited",
        PositionState::WATCHLIST => "watchlist",
        PositionState::ENTRY1 => "entry1",
        PositionState::ENTRY2 => "entry2",
        PositionState::ENTRY3 => "entry3",
        PositionState::TP1_TAKEN => "tp1_taken",
        PositionState::TP2_TAKEN => "tp2_taken",
        PositionState::TRAILING => "trailing",
        _ => "other",
    }
}

/// Push-based metrics reporter.
///
/// Outputs metrics as structured JSON logs on a configurable interval.
/// No HTTP server, no incoming connections - only outbound data.
pub struct MetricsReporter {
    positions: Arc<dyn PositionRepository>,
    regime: Arc<dyn RegimeRepository>,
    supervisor: Arc<Mutex<Supervisor>>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        regime: Arc<dyn RegimeRepository>,
        supervisor: Arc<Mutex<Supervisor>>,
        metrics: Metrics,
        interval_seconds: u64,
    ) -> Self {
        Self {
            positions,
            regime,
            supervisor,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically.
    pub async fn run(self) {
        info!(interval = ?self.interval, "metrics reporter starting push-based metrics");

        loop {
            tokio::time::sleep(self.interval).await;

            match self.collect_snapshot().await {
                Ok(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        println!("METRICS_JSON:{}", json);
                        info!(
                            positions = snapshot.positions.total,
                            uptime_seconds = snapshot.uptime_seconds,
                            "metrics snapshot collected"
                        );
                    }
                    Err(e) => warn!(error = %e, "failed to serialize metrics"),
                },
                Err(e) => warn!(error = %e, "failed to collect metrics"),
            }
        }
    }

    /// Collect current metrics snapshot.
    async fn collect_snapshot(&self) -> anyhow::Result<MetricsSnapshot> {
        let uptime = self.start_time.elapsed().as_secs();

        let all_positions = self.positions.list_all().await?;
        let mut counts: std::collections::BTreeMap<&'static str, usize> = std::collections::BTreeMap::new();
        for position in &all_positions {
            *counts.entry(state_label(position.state)).or_insert(0) += 1;
        }
        for (label, count) in &counts {
            self.metrics.set_positions_in_state(label, *count as f64);
        }

        let regime = self.regime.latest().await?.map(|r| {
            self.metrics.regime_composite_score.set(r.composite_score);
            self.metrics.regime_entry_risk_score.set(r.entry_risk_score);
            RegimeSnapshot {
                date: r.date.to_string(),
                composite_score: r.composite_score,
                entry_risk_score: r.entry_risk_score,
                regime: r.regime.to_string(),
            }
        });

        let workers = self.supervisor.lock().await.status().await;
        let worker_snapshots = workers
            .into_iter()
            .map(|w| {
                self.metrics.record_worker_cycle(w.name, 0);
                WorkerSnapshot {
                    name: w.name.to_string(),
                    state: format!("{:?}", w.status.state),
                    messages_processed: w.status.messages_processed,
                    errors: w.status.errors,
                }
            })
            .collect();

        self.metrics.uptime_seconds.set(uptime as f64);

        Ok(MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            positions: PositionsSnapshot {
                total: all_positions.len(),
                by_state: counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            },
            regime,
            workers: worker_snapshots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RepositoryError;
    use crate::domain::market_regime::MarketRegimeAlert;
    use crate::domain::position::{Position, TransitionFields};
    use crate::domain::position_history::{ChangeSource, PositionHistoryEntry};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct EmptyPositions;

    #[async_trait]
    impl PositionRepository for EmptyPositions {
        async fn get(&self, _id: i64) -> Result<Position, RepositoryError> {
            Err(RepositoryError::PositionNotFound(0))
        }
        async fn get_by_symbol(&self, _symbol: &str, _portfolio: &str) -> Result<Option<Position>, RepositoryError> {
            Ok(None)
        }
        async fn list_active(&self) -> Result<Vec<Position>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn list_watchlist(&self) -> Result<Vec<Position>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn list_watching_exited(&self) -> Result<Vec<Position>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn list_all(&self) -> Result<Vec<Position>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn create(&self, position: Position) -> Result<Position, RepositoryError> {
            Ok(position)
        }
        async fn update(
            &self,
            _id: i64,
            _mutate: Box<dyn FnOnce(&mut Position) + Send>,
            _source: ChangeSource,
        ) -> Result<Position, RepositoryError> {
            Err(RepositoryError::PositionNotFound(0))
        }
        async fn transition(
            &self,
            _id: i64,
            _to: PositionState,
            _fields: TransitionFields,
        ) -> Result<Position, RepositoryError> {
            Err(RepositoryError::PositionNotFound(0))
        }
        async fn history(&self, _id: i64) -> Result<Vec<PositionHistoryEntry>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    struct EmptyRegime;

    #[async_trait]
    impl RegimeRepository for EmptyRegime {
        async fn upsert(&self, _alert: MarketRegimeAlert) -> Result<(), RepositoryError> {
            Ok(())
        }
        async fn latest(&self) -> Result<Option<MarketRegimeAlert>, RepositoryError> {
            Ok(None)
        }
        async fn for_date(&self, _date: NaiveDate) -> Result<Option<MarketRegimeAlert>, RepositoryError> {
            Ok(None)
        }
        async fn range(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<MarketRegimeAlert>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn collects_an_empty_snapshot_without_error() {
        let positions: Arc<dyn PositionRepository> = Arc::new(EmptyPositions);
        let regime: Arc<dyn RegimeRepository> = Arc::new(EmptyRegime);
        let supervisor = Arc::new(Mutex::new(Supervisor::new(Duration::from_secs(30))));
        let metrics = Metrics::new().expect("failed to create metrics");
        let reporter = MetricsReporter::new(positions, regime, supervisor, metrics, 60);

        let snapshot = reporter.collect_snapshot().await.expect("failed to collect snapshot");
        assert_eq!(snapshot.positions.total, 0);
        assert!(snapshot.regime.is_none());
        assert!(!snapshot.timestamp.is_empty());
    }

    #[test]
    fn state_labels_cover_every_named_state() {
        assert_eq!(state_label(PositionState::WATCHLIST), "watchlist");
        assert_eq!(state_label(PositionState::ENTRY1), "entry1");
        assert_eq!(state_label(PositionState::TRAILING), "trailing");
        assert_eq!(state_label(PositionState::STOPPED_OUT), "stopped_out");
    }
}
