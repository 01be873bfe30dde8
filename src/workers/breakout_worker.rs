//! `BreakoutWorker`: polls watchlist positions with a pivot set and runs
//! the breakout checker suite (spec §4.9).

use crate::alerts::AlertService;
use crate::infrastructure::observability::Metrics;
use crate::calendar::MarketCalendar;
use crate::checkers::CheckerSuite;
use crate::config::Config;
use crate::domain::errors::ProviderError;
use crate::domain::ports::{HistoricalBarsProvider, Notifier, RealtimeQuoteProvider};
use crate::domain::repositories::{AlertRepository, PositionRepository};
use crate::workers::{RegimeSnapshot, Worker, build_position_context};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct BreakoutWorker {
    positions: Arc<dyn PositionRepository>,
    quotes: Arc<dyn RealtimeQuoteProvider>,
    bars: Arc<dyn HistoricalBarsProvider>,
    alert_repo: Arc<dyn AlertRepository>,
    notifier: Arc<dyn Notifier>,
    calendar: Arc<MarketCalendar>,
    regime: Arc<RegimeSnapshot>,
    config: Config,
    metrics: Metrics,
    suite: CheckerSuite,
}

impl BreakoutWorker {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        quotes: Arc<dyn RealtimeQuoteProvider>,
        bars: Arc<dyn HistoricalBarsProvider>,
        alert_repo: Arc<dyn AlertRepository>,
        notifier: Arc<dyn Notifier>,
        calendar: Arc<MarketCalendar>,
        regime: Arc<RegimeSnapshot>,
        config: Config,
        metrics: Metrics,
    ) -> Self {
        Self {
            positions,
            quotes,
            bars,
            alert_repo,
            notifier,
            calendar,
            regime,
            config,
            metrics,
            suite: CheckerSuite::breakout_suite(),
        }
    }
}

#[async_trait]
impl Worker for BreakoutWorker {
    fn name(&self) -> &'static str {
        "breakout_worker"
    }

    fn cadence(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn run_cycle(&self) -> anyhow::Result<u64> {
        let now = Utc::now();
        if !self.calendar.is_market_open(now).await {
            return Ok(0);
        }

        let targets: Vec<_> = self
            .positions
            .list_watchlist()
            .await?
            .into_iter()
            .filter(|p| p.pivot.is_some())
            .collect();

        let alert_service = AlertService::new(self.alert_repo.as_ref(), self.notifier.as_ref(), &self.config.alerts, Some(&self.metrics));
        let market_regime = self.regime.regime().await;
        let mut processed = 0u64;

        for position in targets {
            let quote = match self.quotes.quote(&position.symbol).await {
                Ok(quote) => quote,
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "quote lookup failed, skipping watchlist symbol this cycle");
                    continue;
                }
            };

            let start = (now - ChronoDuration::days(140)).date_naive();
            let daily_bars = match self.bars.bars(&position.symbol, start, now.date_naive()).await {
                Ok(bars) => bars,
                Err(ProviderError::NoData(_)) => Vec::new(),
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "bars lookup failed, skipping watchlist symbol this cycle");
                    continue;
                }
            };

            let ctx = build_position_context(&position, &quote, &daily_bars, market_regime, None, now);
            let candidates = self.suite.evaluate(&ctx, &self.config, self.alert_repo.as_ref()).await;
            for data in candidates {
                if let Err(e) = alert_service.emit(data, now).await {
                    warn!(symbol = %position.symbol, error = %e, "failed to persist alert");
                }
            }

            processed += 1;
        }

        Ok(processed)
    }
}
