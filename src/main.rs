use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use canslim_monitor::calendar::MarketCalendar;
use canslim_monitor::config::{Cli, Config};
use canslim_monitor::infrastructure::observability::{Metrics, MetricsReporter};
use canslim_monitor::infrastructure::persistence::Database;
use canslim_monitor::infrastructure::persistence::repositories::{
    SqliteAlertRepository, SqliteDistributionDayRepository, SqliteOutcomeRepository,
    SqlitePositionRepository, SqliteRegimeRepository,
};
use canslim_monitor::infrastructure::providers::{
    AlphaVantageBarsProvider, AlternativeMeSentimentProvider, BarsBackedQuoteProvider,
    HttpCalendarFeed, WebhookNotifier,
};
use canslim_monitor::supervisor::Supervisor;
use canslim_monitor::supervisor::ipc;
use canslim_monitor::workers::{BreakoutWorker, MarketWorker, PositionWorker, RegimeSnapshot};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let db_url = format!("sqlite://{}", config.database.path);
    let database = Database::new(&db_url).await?;
    info!(path = %config.database.path, "database ready");

    let positions = Arc::new(SqlitePositionRepository::new(database.clone()));
    let alert_repo = Arc::new(SqliteAlertRepository::new(database.clone()));
    let regime_repo = Arc::new(SqliteRegimeRepository::new(database.clone()));
    let d_day_repo = Arc::new(SqliteDistributionDayRepository::new(database.clone()));
    let outcomes = Arc::new(SqliteOutcomeRepository::new(database.clone()));

    let bars = Arc::new(AlphaVantageBarsProvider::new(config.historical_provider.clone()));
    let quotes = Arc::new(BarsBackedQuoteProvider::new(bars.clone()));
    let sentiment = Arc::new(AlternativeMeSentimentProvider::new(Duration::from_millis(5_000)));
    let notifier = Arc::new(WebhookNotifier::new(config.notifier.clone()));

    let calendar_feed = config.calendar.status_feed_url.clone().map(|url| {
        Arc::new(HttpCalendarFeed::new(url, Duration::from_millis(config.calendar.timeout_ms)))
            as Arc<dyn canslim_monitor::domain::ports::MarketCalendarFeed>
    });
    let calendar = Arc::new(MarketCalendar::new(calendar_feed, config.calendar.clone()));
    let regime_snapshot = Arc::new(RegimeSnapshot::default());

    let metrics = Metrics::new()?;

    let mut supervisor = Supervisor::new(Duration::from_secs(120));

    {
        let bars = bars.clone();
        let sentiment = sentiment.clone();
        let regime_repo = regime_repo.clone();
        let d_day_repo = d_day_repo.clone();
        let calendar = calendar.clone();
        let snapshot = regime_snapshot.clone();
        let regime_config = config.market_regime;
        let dday_config = config.distribution_days;
        supervisor.spawn("market_worker", move || {
            Arc::new(MarketWorker::new(
                bars.clone(),
                Some(sentiment.clone()),
                regime_repo.clone(),
                d_day_repo.clone(),
                calendar.clone(),
                snapshot.clone(),
                regime_config,
                dday_config,
            ))
        });
    }

    {
        let positions = positions.clone();
        let quotes = quotes.clone();
        let bars = bars.clone();
        let alert_repo = alert_repo.clone();
        let notifier = notifier.clone();
        let calendar = calendar.clone();
        let snapshot = regime_snapshot.clone();
        let config = config.clone();
        let metrics = metrics.clone();
        supervisor.spawn("breakout_worker", move || {
            Arc::new(BreakoutWorker::new(
                positions.clone(),
                quotes.clone(),
                bars.clone(),
                alert_repo.clone(),
                notifier.clone(),
                calendar.clone(),
                snapshot.clone(),
                config.clone(),
                metrics.clone(),
            ))
        });
    }

    {
        let positions = positions.clone();
        let quotes = quotes.clone();
        let bars = bars.clone();
        let alert_repo = alert_repo.clone();
        let outcomes = outcomes.clone();
        let notifier = notifier.clone();
        let calendar = calendar.clone();
        let snapshot = regime_snapshot.clone();
        let config = config.clone();
        let metrics = metrics.clone();
        supervisor.spawn("position_worker", move || {
            Arc::new(PositionWorker::new(
                positions.clone(),
                quotes.clone(),
                bars.clone(),
                alert_repo.clone(),
                outcomes.clone(),
                notifier.clone(),
                calendar.clone(),
                snapshot.clone(),
                config.clone(),
                metrics.clone(),
            ))
        });
    }

    let supervisor = Arc::new(Mutex::new(supervisor));

    let reporter = MetricsReporter::new(
        positions.clone(),
        regime_repo.clone(),
        supervisor.clone(),
        metrics,
        60,
    );
    let reporter_handle = tokio::spawn(reporter.run());

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let ipc_supervisor = supervisor.clone();
    let socket_path = config.ipc_socket_path.clone();
    let ipc_handle = tokio::spawn(async move {
        // `ipc_supervisor` derefs to `&Mutex<Supervisor>`; `serve` takes its
        // own lock per command so STATUS/REFRESH/RESTART always see the
        // live worker fleet (spec §4.10).
        if let Err(e) = ipc::serve(&socket_path, &ipc_supervisor, shutdown_tx).await {
            error!(error = %e, "ipc server exited");
        }
    });

    info!("monitor started: market_worker, breakout_worker, position_worker, ipc server");

    if cli.once {
        info!("--once: running a single cycle per worker, then exiting");
        let reports = supervisor.lock().await.status().await;
        for r in reports {
            info!(worker = r.name, state = ?r.status.state, "worker status at startup");
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    } else {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received, shutting down");
            }
            _ = shutdown_rx.recv() => {
                info!("shutdown requested over ipc socket");
            }
        }
    }

    ipc_handle.abort();
    reporter_handle.abort();

    // `Supervisor::stop` consumes its receiver, but the reporter/ipc tasks
    // each hold their own `Arc` clone of the shared `Mutex`, so we can never
    // be the sole owner here. Swap in an empty placeholder under the lock
    // and stop the real one outside it.
    let owned_supervisor = {
        let mut guard = supervisor.lock().await;
        std::mem::replace(&mut *guard, Supervisor::new(Duration::from_secs(0)))
    };
    owned_supervisor.stop(Duration::from_secs(30)).await;

    info!("monitor stopped");
    Ok(())
}
