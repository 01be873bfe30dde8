//! Long-lived monitoring workers and their common loop mechanics (spec §4.9).

pub mod breakout_worker;
pub mod market_worker;
pub mod position_worker;

pub use breakout_worker::BreakoutWorker;
pub use market_worker::MarketWorker;
pub use position_worker::PositionWorker;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{error, info};

use crate::domain::checker_context::PositionContext;
use crate::domain::market_regime::MarketRegimeAlert;
use crate::domain::position::Position;
use crate::domain::types::{Bar, Grade, Quote, Regime};
use crate::scoring::indicators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Waiting,
    Error,
    Stopped,
}

/// `messages_processed`, `errors`, `last_check`, `state` (spec §4.9 "Common
/// mechanism").
#[derive(Debug)]
pub struct WorkerCounters {
    messages_processed: AtomicU64,
    errors: AtomicU64,
    last_check: Mutex<Option<DateTime<Utc>>>,
    state: Mutex<WorkerState>,
}

impl Default for WorkerCounters {
    fn default() -> Self {
        Self {
            messages_processed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            last_check: Mutex::new(None),
            state: Mutex::new(WorkerState::Idle),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub messages_processed: u64,
    pub errors: u64,
    pub last_check: Option<DateTime<Utc>>,
}

impl WorkerCounters {
    pub async fn snapshot(&self) -> WorkerStatus {
        WorkerStatus {
            state: *self.state.lock().await,
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_check: *self.last_check.lock().await,
        }
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.lock().await = state;
    }

    async fn record_cycle(&self, processed: u64) {
        self.messages_processed.fetch_add(processed, Ordering::Relaxed);
        *self.last_check.lock().await = Some(Utc::now());
        self.set_state(WorkerState::Waiting).await;
    }

    async fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        *self.last_check.lock().await = Some(Utc::now());
        self.set_state(WorkerState::Error).await;
    }
}

/// Commands the supervisor can send to a running worker (spec §4.10).
#[derive(Debug, Clone, Copy)]
pub enum WorkerCommand {
    Refresh,
    Shutdown,
}

/// One evaluation cycle over a worker's target set. Implementations own
/// their dependencies (repositories, providers, checker suite) and report
/// how many targets were processed.
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &'static str;
    fn cadence(&self) -> Duration;
    async fn run_cycle(&self) -> anyhow::Result<u64>;
}

pub struct WorkerHandle {
    pub name: &'static str,
    pub counters: Arc<WorkerCounters>,
    pub commands: mpsc::Sender<WorkerCommand>,
}

/// Spawn a worker onto its own task: each poll cycle is bounded by its own
/// timeout, sleeps between cycles until the next tick or a supervisor
/// command, and never lets one target's failure sink the cycle (spec §4.9).
pub fn spawn_worker(worker: Arc<dyn Worker>, cycle_timeout: Duration) -> (WorkerHandle, tokio::task::JoinHandle<()>) {
    let counters = Arc::new(WorkerCounters::default());
    let (tx, mut rx) = mpsc::channel(8);
    let loop_counters = counters.clone();
    let name = worker.name();

    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(worker.cadence());
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                cmd = rx.recv() => match cmd {
                    None | Some(WorkerCommand::Shutdown) => break,
                    Some(WorkerCommand::Refresh) => {}
                }
            }

            loop_counters.set_state(WorkerState::Running).await;
            match tokio::time::timeout(cycle_timeout, worker.run_cycle()).await {
                Ok(Ok(processed)) => loop_counters.record_cycle(processed).await,
                Ok(Err(e)) => {
                    error!(worker = name, error = %e, "worker cycle failed");
                    loop_counters.record_error().await;
                }
                Err(_) => {
                    error!(worker = name, "worker cycle timed out");
                    loop_counters.record_error().await;
                }
            }
        }
        loop_counters.set_state(WorkerState::Stopped).await;
        info!(worker = name, "worker stopped");
    });

    (WorkerHandle { name, counters, commands: tx }, join)
}

/// Last computed market regime, shared between `MarketWorker` (writer) and
/// `BreakoutWorker`/`PositionWorker` (readers) without a repository round
/// trip on every cycle.
#[derive(Default)]
pub struct RegimeSnapshot(RwLock<Option<MarketRegimeAlert>>);

impl RegimeSnapshot {
    pub async fn regime(&self) -> Option<Regime> {
        self.0.read().await.as_ref().map(|a| a.regime)
    }

    pub async fn set(&self, alert: MarketRegimeAlert) {
        *self.0.write().await = Some(alert);
    }
}

fn parse_grade(raw: &str) -> Option<Grade> {
    Some(match raw {
        "A+" => Grade::APlus,
        "A" => Grade::A,
        "B+" => Grade::BPlus,
        "B" => Grade::B,
        "C+" => Grade::CPlus,
        "C" => Grade::C,
        "D" => Grade::D,
        "F" => Grade::F,
        _ => return None,
    })
}

/// Build the stateless checker-facing snapshot for one position from its
/// stored record, a live quote, and its recent daily bars (spec §4.8). Bars
/// must be ordered oldest first with today's bar last.
pub(crate) fn build_position_context(
    position: &Position,
    quote: &Quote,
    daily_bars: &[Bar],
    market_regime: Option<Regime>,
    spy_price: Option<Decimal>,
    now: DateTime<Utc>,
) -> PositionContext {
    let pnl_pct = if position.avg_cost > Decimal::ZERO {
        ((quote.last - position.avg_cost) / position.avg_cost * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };

    let ma_10_week = if daily_bars.len() >= 70 {
        let weekly = indicators::aggregate_weekly(daily_bars);
        indicators::moving_average_series(&weekly, 10)
            .last()
            .and_then(|v| Decimal::try_from(*v).ok())
    } else {
        None
    };

    let running_high = daily_bars.iter().map(|b| b.high).max();

    let close_below = |ma: Decimal| -> u32 {
        daily_bars
            .iter()
            .rev()
            .take_while(|b| b.close < ma)
            .count() as u32
    };
    let close_below_ma50_streak = close_below(quote.ma_50);
    let close_below_ma21_streak = close_below(quote.ma_21);

    let previously_extended = match position.original_pivot {
        Some(pivot) if pivot > Decimal::ZERO => {
            let ceiling = pivot * Decimal::new(105, 2);
            daily_bars.iter().any(|b| b.close > ceiling)
        }
        _ => false,
    };

    let gap_up_pct = (daily_bars.len() >= 2 && daily_bars[daily_bars.len() - 2].close > Decimal::ZERO).then(|| {
        let today = &daily_bars[daily_bars.len() - 1];
        let yesterday = &daily_bars[daily_bars.len() - 2];
        ((today.open - yesterday.close) / yesterday.close * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    });

    let entry_date = [position.e1, position.e2, position.e3]
        .iter()
        .filter_map(|t| t.date)
        .min();
    let weeks_held = entry_date.map(|d| (now.date_naive() - d).num_days() as f64 / 7.0).unwrap_or(0.0);

    PositionContext {
        symbol: position.symbol.clone(),
        position_id: position.id,
        state: position.state.0,
        grade: position.entry_grade.as_deref().and_then(parse_grade),
        score: position.entry_score,
        market_regime,
        spy_price,
        current_price: quote.last,
        avg_cost: position.avg_cost,
        pivot: position.pivot,
        original_pivot: position.original_pivot,
        stop_price: position.stop_price,
        tp1_target: position.tp1_target,
        tp2_target: position.tp2_target,
        pnl_pct,
        ma_21: Some(quote.ma_21),
        ma_50: Some(quote.ma_50),
        ma_200: Some(quote.ma_200),
        ma_10_week,
        volume_ratio: quote.rvol(),
        rvol: quote.rvol(),
        entry_date,
        earnings_date: position.earnings_date,
        now,
        running_high,
        close_below_ma50_streak,
        close_below_ma21_streak,
        previously_extended,
        gap_up_pct,
        weeks_held,
    }
}
