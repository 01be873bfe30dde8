//! `PositionWorker`: polls every open position (`state >= 1` and
//! `WATCHING_EXITED`), refreshes price/technicals, and runs the position
//! checker suite (spec §4.9).

use crate::alerts::AlertService;
use crate::infrastructure::observability::Metrics;
use crate::calendar::MarketCalendar;
use crate::checkers::CheckerSuite;
use crate::config::Config;
use crate::domain::errors::ProviderError;
use crate::domain::ports::{HistoricalBarsProvider, Notifier, RealtimeQuoteProvider};
use crate::domain::outcome::{Outcome, OutcomeKind};
use crate::domain::position::{PositionState, TransitionFields};
use crate::domain::position_history::ChangeSource;
use crate::domain::repositories::{AlertRepository, OutcomeRepository, PositionRepository};
use crate::workers::{RegimeSnapshot, Worker, build_position_context};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct PositionWorker {
    positions: Arc<dyn PositionRepository>,
    quotes: Arc<dyn RealtimeQuoteProvider>,
    bars: Arc<dyn HistoricalBarsProvider>,
    alert_repo: Arc<dyn AlertRepository>,
    outcomes: Arc<dyn OutcomeRepository>,
    notifier: Arc<dyn Notifier>,
    calendar: Arc<MarketCalendar>,
    regime: Arc<RegimeSnapshot>,
    config: Config,
    metrics: Metrics,
    suite: CheckerSuite,
}

impl PositionWorker {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        quotes: Arc<dyn RealtimeQuoteProvider>,
        bars: Arc<dyn HistoricalBarsProvider>,
        alert_repo: Arc<dyn AlertRepository>,
        outcomes: Arc<dyn OutcomeRepository>,
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
            outcomes,
            notifier,
            calendar,
            regime,
            config,
            metrics,
            suite: CheckerSuite::position_suite(),
        }
    }
}

#[async_trait]
impl Worker for PositionWorker {
    fn name(&self) -> &'static str {
        "position_worker"
    }

    fn cadence(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn run_cycle(&self) -> anyhow::Result<u64> {
        let now = Utc::now();
        if !self.calendar.is_market_open(now).await {
            return Ok(0);
        }

        let mut targets = self.positions.list_active().await?;
        let watching_exited = self.positions.list_watching_exited().await?;

        let alert_service = AlertService::new(self.alert_repo.as_ref(), self.notifier.as_ref(), &self.config.alerts, Some(&self.metrics));
        let market_regime = self.regime.regime().await;
        let mut processed = 0u64;

        let expiry = ChronoDuration::days(self.config.watching_exited_expiry_days);
        for position in watching_exited {
            let stale = position
                .watching_exited_since
                .is_some_and(|since| now.signed_duration_since(since) > expiry);
            if !stale {
                targets.push(position);
                continue;
            }
            let fields = TransitionFields {
                exit_date: Some(now.date_naive()),
                exit_price: position.last_price,
                ..Default::default()
            };
            match self.positions.transition(position.id, PositionState::STOPPED_OUT, fields).await {
                Ok(_) => processed += 1,
                Err(e) => warn!(symbol = %position.symbol, error = %e, "watching-exited expiry transition failed"),
            }
        }

        for position in targets {
            let quote = match self.quotes.quote(&position.symbol).await {
                Ok(quote) => quote,
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "quote lookup failed, skipping position this cycle");
                    continue;
                }
            };

            let start = (now - ChronoDuration::days(140)).date_naive();
            let daily_bars = match self.bars.bars(&position.symbol, start, now.date_naive()).await {
                Ok(bars) => bars,
                Err(ProviderError::NoData(_)) => Vec::new(),
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "bars lookup failed, skipping position this cycle");
                    continue;
                }
            };

            let updated = match self.positions.update(
                position.id,
                Box::new(move |p| p.recalculate_pnl(quote.last)),
                ChangeSource::PriceUpdate,
            ).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "price update failed, skipping position this cycle");
                    continue;
                }
            };

            let ctx = build_position_context(&updated, &quote, &daily_bars, market_regime, None, now);
            let candidates = self.suite.evaluate(&ctx, &self.config, self.alert_repo.as_ref()).await;
            for data in candidates {
                if let Err(e) = alert_service.emit(data, now).await {
                    warn!(symbol = %updated.symbol, error = %e, "failed to persist alert");
                }
            }

            if stopped_out(&ctx) {
                let fields = TransitionFields {
                    exit_date: Some(now.date_naive()),
                    exit_price: Some(ctx.current_price),
                    ..Default::default()
                };
                match self.positions.transition(updated.id, PositionState::STOPPED_OUT, fields).await {
                    Ok(closed) => {
                        let outcome = Outcome {
                            id: 0,
                            position_id: closed.id,
                            symbol: closed.symbol.clone(),
                            entry_date: ctx.entry_date.unwrap_or(now.date_naive()),
                            exit_date: now.date_naive(),
                            entry_grade: closed.entry_grade.clone(),
                            entry_score: closed.entry_score,
                            rs_rating: closed.rs_rating,
                            eps_rating: closed.eps_rating,
                            pattern: closed.pattern.clone(),
                            base_stage: closed.base_stage.clone(),
                            gross_pct: ctx.pnl_pct,
                            holding_days: ctx.entry_date.map(|d| (now.date_naive() - d).num_days()).unwrap_or(0),
                            outcome: OutcomeKind::Stopped,
                        };
                        if let Err(e) = self.outcomes.insert(outcome).await {
                            warn!(symbol = %closed.symbol, error = %e, "failed to record outcome for stopped-out position");
                        }
                    }
                    Err(e) => warn!(symbol = %updated.symbol, error = %e, "stop-out transition failed"),
                }
            }

            processed += 1;
        }

        Ok(processed)
    }
}

/// Hard-stop breach is a worker-level transition trigger, not merely an
/// alert: once price closes through the stop the position leaves the
/// active set on its own (spec §6 state machine table, `STOPPED_OUT`).
fn stopped_out(ctx: &crate::domain::checker_context::PositionContext) -> bool {
    matches!(ctx.stop_price, Some(stop) if stop > rust_decimal::Decimal::ZERO && ctx.current_price <= stop)
}
