//! `MarketWorker`: the 15-minute market-regime heartbeat, plus a one-shot
//! "morning" log line shortly after the open (spec §4.9).

use crate::calendar::MarketCalendar;
use crate::config::{DistributionDaysConfig, MarketRegimeConfig};
use crate::domain::errors::ProviderError;
use crate::domain::ports::{HistoricalBarsProvider, SentimentProvider};
use crate::domain::repositories::{DistributionDayRepository, RegimeRepository};
use crate::regime::distribution_day;
use crate::regime::follow_through::{self, FtdState};
use crate::regime::{RegimeCalculator, RegimeInputs};
use crate::workers::{RegimeSnapshot, Worker};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

const SPY: &str = "SPY";
const QQQ: &str = "QQQ";
const ES: &str = "ES=F";
const NQ: &str = "NQ=F";
const YM: &str = "YM=F";
const VIX: &str = "^VIX";
const D_DAY_HISTORY: usize = 10;

pub struct MarketWorker {
    bars: Arc<dyn HistoricalBarsProvider>,
    sentiment: Option<Arc<dyn SentimentProvider>>,
    regime_repo: Arc<dyn RegimeRepository>,
    d_day_repo: Arc<dyn DistributionDayRepository>,
    calendar: Arc<MarketCalendar>,
    snapshot: Arc<RegimeSnapshot>,
    config: MarketRegimeConfig,
    dday_config: DistributionDaysConfig,
    calculator: RegimeCalculator,
    ftd_state: Mutex<FtdState>,
    d_day_history: Mutex<VecDeque<(u32, u32)>>,
    last_morning_run: Mutex<Option<NaiveDate>>,
}

impl MarketWorker {
    pub fn new(
        bars: Arc<dyn HistoricalBarsProvider>,
        sentiment: Option<Arc<dyn SentimentProvider>>,
        regime_repo: Arc<dyn RegimeRepository>,
        d_day_repo: Arc<dyn DistributionDayRepository>,
        calendar: Arc<MarketCalendar>,
        snapshot: Arc<RegimeSnapshot>,
        config: MarketRegimeConfig,
        dday_config: DistributionDaysConfig,
    ) -> Self {
        Self {
            bars,
            sentiment,
            regime_repo,
            d_day_repo,
            calendar,
            snapshot,
            calculator: RegimeCalculator::new(config),
            config,
            dday_config,
            ftd_state: Mutex::new(FtdState::default()),
            d_day_history: Mutex::new(VecDeque::with_capacity(D_DAY_HISTORY)),
            last_morning_run: Mutex::new(None),
        }
    }

    async fn day_over_day_change_pct(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> f64 {
        match self.bars.bars(symbol, start, end).await {
            Ok(bars) if bars.len() >= 2 => {
                let prev = bars[bars.len() - 2].close.to_f64().unwrap_or(0.0);
                let last = bars[bars.len() - 1].close.to_f64().unwrap_or(0.0);
                if prev != 0.0 { (last - prev) / prev * 100.0 } else { 0.0 }
            }
            Ok(_) => 0.0,
            Err(e) => {
                warn!(symbol, error = %e, "futures/vix bars lookup failed, treating as flat");
                0.0
            }
        }
    }

    /// Fires once per session, on the first cycle after the market opens
    /// (spec §4.9 "one-shot ~10 minutes after the open"). The 15-minute
    /// cadence means this lands somewhere in the open's first cycle rather
    /// than at an exact offset.
    async fn maybe_log_morning_run(&self, now: chrono::DateTime<Utc>) {
        if !self.calendar.is_market_open(now).await {
            return;
        }
        let today = now.date_naive();
        let mut last = self.last_morning_run.lock().await;
        if *last == Some(today) {
            return;
        }
        *last = Some(today);
        info!("market worker morning run: regime refreshed shortly after the open");
    }
}

#[async_trait]
impl Worker for MarketWorker {
    fn name(&self) -> &'static str {
        "market_worker"
    }

    fn cadence(&self) -> Duration {
        Duration::from_secs(900)
    }

    async fn run_cycle(&self) -> anyhow::Result<u64> {
        let now = Utc::now();
        let today = now.date_naive();
        let start = today - ChronoDuration::days(260);

        let spy_bars = self.bars.bars(SPY, start, today).await?;
        let qqq_bars = self.bars.bars(QQQ, start, today).await?;
        if spy_bars.len() < 2 || qqq_bars.len() < 2 {
            return Err(ProviderError::NoData("insufficient SPY/QQQ history for a regime cycle".into()).into());
        }

        for (symbol, window) in [(SPY, &spy_bars), (QQQ, &qqq_bars)] {
            let today_bar = window[window.len() - 1];
            let yesterday_bar = window[window.len() - 2];
            if distribution_day::is_distribution_day(&today_bar, &yesterday_bar, &self.dday_config) {
                let day = distribution_day::record(symbol, &today_bar, &yesterday_bar);
                self.d_day_repo.insert(day).await?;
            }

            let window_len = self.dday_config.rolling_window_sessions as usize;
            if let Some(cutoff_bar) = window.len().checked_sub(window_len).and_then(|i| window.get(i)) {
                self.d_day_repo.expire_older_than(symbol, cutoff_bar.date).await?;
            }
        }

        let spy_d_day_count = self.d_day_repo.active_for_symbol(SPY).await?.len() as u32;
        let qqq_d_day_count = self.d_day_repo.active_for_symbol(QQQ).await?.len() as u32;

        let (spy_d_count_5d_ago, qqq_d_count_5d_ago) = {
            let mut history = self.d_day_history.lock().await;
            let five_days_ago = if history.len() >= 5 {
                history[history.len() - 5]
            } else {
                (spy_d_day_count, qqq_d_day_count)
            };
            history.push_back((spy_d_day_count, qqq_d_day_count));
            if history.len() > D_DAY_HISTORY {
                history.pop_front();
            }
            five_days_ago
        };

        let es_change_pct = self.day_over_day_change_pct(ES, start, today).await;
        let nq_change_pct = self.day_over_day_change_pct(NQ, start, today).await;
        let ym_change_pct = self.day_over_day_change_pct(YM, start, today).await;
        let vix_close = match self.bars.bars(VIX, start, today).await {
            Ok(bars) => bars.last().and_then(|b| b.close.to_f64()),
            Err(_) => None,
        };

        let fear_greed = match &self.sentiment {
            Some(provider) => provider.fear_greed().await.ok(),
            None => None,
        };

        let mut ftd_state = self.ftd_state.lock().await;
        *ftd_state = follow_through::advance(&ftd_state, &spy_bars, spy_d_day_count, &self.config);

        let inputs = RegimeInputs {
            date: today,
            spy_bars: &spy_bars,
            qqq_bars: &qqq_bars,
            es_change_pct,
            nq_change_pct,
            ym_change_pct,
            fear_greed_score: fear_greed.map(|f| f.score),
            fear_greed_rating: fear_greed.map(|f| format!("{:?}", f.rating)),
            vix_close,
            spy_d_day_count,
            qqq_d_day_count,
            spy_d_count_5d_ago,
            qqq_d_count_5d_ago,
            ftd_state: &ftd_state,
        };
        let alert = self.calculator.compute(&inputs);
        drop(ftd_state);

        self.regime_repo.upsert(alert.clone()).await?;
        self.snapshot.set(alert.clone()).await;
        info!(regime = %alert.regime, composite_score = alert.composite_score, "market regime refreshed");

        self.maybe_log_morning_run(now).await;

        Ok(1)
    }
}
