//! Sqlite connection pool and schema bootstrap, grounded on the pool-setup
//! pattern used throughout this codebase: WAL journal mode, a bounded
//! connection pool, `CREATE TABLE IF NOT EXISTS` plus best-effort `ALTER
//! TABLE` migrations for columns added after a table's first release.

use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to connect to sqlite database")?;

        info!(db_url, "connected to database");

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                portfolio TEXT NOT NULL,
                state REAL NOT NULL,
                e1_shares TEXT NOT NULL DEFAULT '0',
                e1_price TEXT NOT NULL DEFAULT '0',
                e1_date DATE,
                e2_shares TEXT NOT NULL DEFAULT '0',
                e2_price TEXT NOT NULL DEFAULT '0',
                e2_date DATE,
                e3_shares TEXT NOT NULL DEFAULT '0',
                e3_price TEXT NOT NULL DEFAULT '0',
                e3_date DATE,
                tp1_sold TEXT NOT NULL DEFAULT '0',
                tp1_price TEXT NOT NULL DEFAULT '0',
                tp1_date DATE,
                tp2_sold TEXT NOT NULL DEFAULT '0',
                tp2_price TEXT NOT NULL DEFAULT '0',
                tp2_date DATE,
                total_shares TEXT NOT NULL DEFAULT '0',
                avg_cost TEXT NOT NULL DEFAULT '0',
                current_pnl_pct REAL NOT NULL DEFAULT 0,
                stop_price TEXT,
                tp1_target TEXT,
                tp2_target TEXT,
                hard_stop_pct REAL NOT NULL DEFAULT 7,
                tp1_pct REAL NOT NULL DEFAULT 20,
                tp2_pct REAL NOT NULL DEFAULT 25,
                pattern TEXT,
                base_stage TEXT,
                base_depth REAL,
                base_length REAL,
                pivot TEXT,
                pivot_set_date DATE,
                original_pivot TEXT,
                rs_rating INTEGER,
                eps_rating INTEGER,
                comp_rating INTEGER,
                ad_rating TEXT,
                industry_rank INTEGER,
                fund_count INTEGER,
                entry_grade TEXT,
                entry_score INTEGER,
                last_price TEXT,
                last_price_time DATETIME,
                avg_volume_50d INTEGER,
                earnings_date DATE,
                needs_sheet_sync BOOLEAN NOT NULL DEFAULT 0,
                watching_exited_since DATETIME,
                ma_test_count INTEGER NOT NULL DEFAULT 0,
                UNIQUE(symbol, portfolio)
            );
            CREATE INDEX IF NOT EXISTS idx_positions_state ON positions (state);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create positions table")?;

        let _ = sqlx::query("ALTER TABLE positions ADD COLUMN ma_test_count INTEGER NOT NULL DEFAULT 0")
            .execute(&mut *conn)
            .await;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS position_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position_id INTEGER NOT NULL,
                field_name TEXT NOT NULL,
                old_value TEXT,
                new_value TEXT,
                change_source TEXT NOT NULL,
                changed_at DATETIME NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_position_history_position ON position_history (position_id, changed_at);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create position_history table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position_id INTEGER,
                symbol TEXT NOT NULL,
                alert_type TEXT NOT NULL,
                alert_subtype TEXT NOT NULL,
                severity TEXT NOT NULL,
                snapshot_json TEXT NOT NULL,
                alert_time DATETIME NOT NULL,
                acknowledged BOOLEAN NOT NULL DEFAULT 0,
                notified_channels_json TEXT NOT NULL DEFAULT '[]'
            );
            CREATE INDEX IF NOT EXISTS idx_alerts_position ON alerts (position_id, alert_time);
            CREATE INDEX IF NOT EXISTS idx_alerts_kind ON alerts (position_id, alert_type, alert_subtype, alert_time);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create alerts table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS market_regime_alerts (
                date DATE PRIMARY KEY,
                composite_score REAL NOT NULL,
                entry_risk_score REAL NOT NULL,
                regime TEXT NOT NULL,
                spy_d_count INTEGER NOT NULL,
                qqq_d_count INTEGER NOT NULL,
                spy_5day_delta INTEGER NOT NULL,
                qqq_5day_delta INTEGER NOT NULL,
                d_day_trend TEXT NOT NULL,
                market_phase TEXT NOT NULL,
                rally_day INTEGER,
                has_confirmed_ftd BOOLEAN NOT NULL,
                es_change_pct REAL NOT NULL,
                nq_change_pct REAL NOT NULL,
                ym_change_pct REAL NOT NULL,
                fear_greed_score INTEGER,
                fear_greed_rating TEXT,
                vix_close REAL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create market_regime_alerts table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS distribution_days (
                symbol TEXT NOT NULL,
                date DATE NOT NULL,
                pct_change REAL NOT NULL,
                volume_ratio REAL NOT NULL,
                trigger_close TEXT NOT NULL,
                expired BOOLEAN NOT NULL DEFAULT 0,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_distribution_days_symbol ON distribution_days (symbol, expired);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create distribution_days table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outcomes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position_id INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                entry_date DATE NOT NULL,
                exit_date DATE NOT NULL,
                entry_grade TEXT,
                entry_score INTEGER,
                rs_rating INTEGER,
                eps_rating INTEGER,
                pattern TEXT,
                base_stage TEXT,
                gross_pct REAL NOT NULL,
                holding_days INTEGER NOT NULL,
                outcome TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_outcomes_symbol ON outcomes (symbol);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create outcomes table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create config_kv table")?;

        info!("database schema initialized");
        Ok(())
    }
}
