//! Historical backfill for the market-regime table (spec §4.6 "Historical
//! seeding"): walks trading days in ascending order, computing one
//! `MarketRegimeAlert` per day so the live `MarketWorker` can start with a
//! populated D-Day window and FTD state instead of a cold one.
//!
//! Rate-limited vendors (e.g. 5 req/min) only need one call per symbol here
//! — the vendor returns its full daily series per call — paced by
//! `historical_provider.rate_limit_delay_secs` between symbols.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use chrono::NaiveDate;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use canslim_monitor::config::{self, Config, DistributionDaysConfig};
use canslim_monitor::domain::errors::ProviderError;
use canslim_monitor::domain::ports::HistoricalBarsProvider;
use canslim_monitor::domain::repositories::{DistributionDayRepository, RegimeRepository};
use canslim_monitor::domain::types::Bar;
use canslim_monitor::infrastructure::persistence::Database;
use canslim_monitor::infrastructure::persistence::repositories::{
    SqliteDistributionDayRepository, SqliteRegimeRepository,
};
use canslim_monitor::infrastructure::providers::AlphaVantageBarsProvider;
use canslim_monitor::regime::follow_through::{self, FtdState};
use canslim_monitor::regime::{RegimeCalculator, RegimeInputs, distribution_day};

const SPY: &str = "SPY";
const QQQ: &str = "QQQ";
const ES: &str = "ES=F";
const NQ: &str = "NQ=F";
const YM: &str = "YM=F";
const VIX: &str = "^VIX";
const D_DAY_HISTORY: usize = 10;

#[derive(Parser, Debug)]
#[command(about = "Backfill market_regime_alerts and distribution_days from historical bars")]
struct SeedCli {
    /// Path to a TOML config file overriding the bundled defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `database.path`.
    #[arg(long)]
    database_path: Option<String>,

    /// First trading day to seed, `YYYY-MM-DD` (default: 260 calendar days back).
    #[arg(long)]
    start: Option<String>,

    /// Last trading day to seed, `YYYY-MM-DD` (default: today).
    #[arg(long)]
    end: Option<String>,

    /// Recompute and overwrite days that already have a stored alert.
    #[arg(long)]
    force: bool,
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| anyhow::anyhow!("invalid date {s:?}: {e}"))
}

/// Day-over-day percent change for the bar dated `date`, against its
/// immediately preceding bar in `series`. Returns `0.0` if `date` isn't
/// present or has no predecessor.
fn change_pct_on(series: &[Bar], date: NaiveDate) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    let Some(idx) = series.iter().position(|b| b.date == date) else {
        return 0.0;
    };
    if idx == 0 {
        return 0.0;
    }
    let prev = series[idx - 1].close.to_f64().unwrap_or(0.0);
    let today = series[idx].close.to_f64().unwrap_or(0.0);
    if prev == 0.0 { 0.0 } else { (today - prev) / prev * 100.0 }
}

fn close_on(series: &[Bar], date: NaiveDate) -> Option<f64> {
    use rust_decimal::prelude::ToPrimitive;
    series.iter().find(|b| b.date == date).and_then(|b| b.close.to_f64())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let seed_cli = SeedCli::parse();
    let base_cli = config::Cli {
        config: seed_cli.config.clone(),
        database_path: seed_cli.database_path.clone(),
        once: false,
        ipc_socket: None,
    };
    let config = Config::load(&base_cli)?;

    let end = match &seed_cli.end {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().date_naive(),
    };
    let start = match &seed_cli.start {
        Some(s) => parse_date(s)?,
        None => end - chrono::Duration::days(260),
    };
    // Fetch extra trailing history so the first seeded day still has a
    // "yesterday" bar for D-Day detection and FTD continuity.
    let fetch_start = start - chrono::Duration::days(60);

    let db_url = format!("sqlite://{}", config.database.path);
    let database = Database::new(&db_url).await?;
    let regime_repo = SqliteRegimeRepository::new(database.clone());
    let d_day_repo = SqliteDistributionDayRepository::new(database.clone());

    let bars_provider = AlphaVantageBarsProvider::new(config.historical_provider.clone());
    let pace = Duration::from_secs(config.historical_provider.rate_limit_delay_secs);

    info!(%start, %end, "fetching historical series for SPY, QQQ, ES=F, NQ=F, YM=F, ^VIX");
    let spy_bars = bars_provider.bars(SPY, fetch_start, end).await?;
    tokio::time::sleep(pace).await;
    let qqq_bars = bars_provider.bars(QQQ, fetch_start, end).await?;
    tokio::time::sleep(pace).await;
    let es_bars = fetch_or_empty(&bars_provider, ES, fetch_start, end).await;
    tokio::time::sleep(pace).await;
    let nq_bars = fetch_or_empty(&bars_provider, NQ, fetch_start, end).await;
    tokio::time::sleep(pace).await;
    let ym_bars = fetch_or_empty(&bars_provider, YM, fetch_start, end).await;
    tokio::time::sleep(pace).await;
    let vix_bars = fetch_or_empty(&bars_provider, VIX, fetch_start, end).await;

    if spy_bars.len() < 2 || qqq_bars.len() < 2 {
        anyhow::bail!("insufficient SPY/QQQ history to seed any trading day");
    }

    let calculator = RegimeCalculator::new(config.market_regime);
    let dday_config: DistributionDaysConfig = config.distribution_days;
    let mut ftd_state = FtdState::default();
    let mut d_day_history: std::collections::VecDeque<(u32, u32)> = std::collections::VecDeque::with_capacity(D_DAY_HISTORY);
    let mut seeded = 0u64;
    let mut skipped = 0u64;

    for i in 1..spy_bars.len() {
        let today = spy_bars[i];
        if today.date < start || today.date > end {
            continue;
        }
        let yesterday = spy_bars[i - 1];
        let spy_window = &spy_bars[..=i];
        let Some(qqq_idx) = qqq_bars.iter().position(|b| b.date == today.date) else {
            warn!(date = %today.date, "no QQQ bar for this SPY trading day, skipping");
            continue;
        };
        if qqq_idx == 0 {
            continue;
        }
        let qqq_window = &qqq_bars[..=qqq_idx];
        let qqq_today = qqq_bars[qqq_idx];
        let qqq_yesterday = qqq_bars[qqq_idx - 1];

        for (symbol, t, y) in [(SPY, today, yesterday), (QQQ, qqq_today, qqq_yesterday)] {
            if distribution_day::is_distribution_day(&t, &y, &dday_config) {
                let day = distribution_day::record(symbol, &t, &y);
                d_day_repo.insert(day).await?;
            }
            let window_len = dday_config.rolling_window_sessions as usize;
            let window = if symbol == SPY { spy_window } else { qqq_window };
            if let Some(cutoff) = window.len().checked_sub(window_len).and_then(|idx| window.get(idx)) {
                d_day_repo.expire_older_than(symbol, cutoff.date).await?;
            }
        }

        let spy_d_day_count = d_day_repo.active_for_symbol(SPY).await?.len() as u32;
        let qqq_d_day_count = d_day_repo.active_for_symbol(QQQ).await?.len() as u32;
        let (spy_d_count_5d_ago, qqq_d_count_5d_ago) = {
            let five_days_ago = if d_day_history.len() >= 5 {
                d_day_history[d_day_history.len() - 5]
            } else {
                (spy_d_day_count, qqq_d_day_count)
            };
            d_day_history.push_back((spy_d_day_count, qqq_d_day_count));
            if d_day_history.len() > D_DAY_HISTORY {
                d_day_history.pop_front();
            }
            five_days_ago
        };

        ftd_state = follow_through::advance(&ftd_state, spy_window, spy_d_day_count, &config.market_regime);

        let inputs = RegimeInputs {
            date: today.date,
            spy_bars: spy_window,
            qqq_bars: qqq_window,
            es_change_pct: change_pct_on(&es_bars, today.date),
            nq_change_pct: change_pct_on(&nq_bars, today.date),
            ym_change_pct: change_pct_on(&ym_bars, today.date),
            fear_greed_score: None,
            fear_greed_rating: None,
            vix_close: close_on(&vix_bars, today.date),
            spy_d_day_count,
            qqq_d_day_count,
            spy_d_count_5d_ago,
            qqq_d_count_5d_ago,
            ftd_state: &ftd_state,
        };
        let alert = calculator.compute(&inputs);

        if !seed_cli.force && regime_repo.for_date(today.date).await?.is_some() {
            skipped += 1;
            continue;
        }
        regime_repo.upsert(alert).await?;
        seeded += 1;
    }

    info!(seeded, skipped, "historical regime seeding complete");
    Ok(())
}

async fn fetch_or_empty(
    provider: &AlphaVantageBarsProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Bar> {
    match provider.bars(symbol, start, end).await {
        Ok(bars) => bars,
        Err(ProviderError::RateLimited(secs)) => {
            warn!(symbol, delay_secs = secs, "rate-limited fetching futures/VIX series, treating as flat");
            Vec::new()
        }
        Err(e) => {
            warn!(symbol, error = %e, "futures/VIX series unavailable, treating as flat");
            Vec::new()
        }
    }
}
