//! `DistributionDayRepository` over sqlite (spec §4.6 "25-session rolling
//! D-Day window").

use crate::domain::errors::RepositoryError;
use crate::domain::market_regime::DistributionDay;
use crate::domain::repositories::DistributionDayRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Row, sqlite::SqliteRow};
use std::str::FromStr;

pub struct SqliteDistributionDayRepository {
    database: Database,
}

impl SqliteDistributionDayRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn row_to_day(row: &SqliteRow) -> Result<DistributionDay, RepositoryError> {
    let trigger_close: String = row.try_get("trigger_close")?;
    Ok(DistributionDay {
        symbol: row.try_get("symbol")?,
        date: row.try_get("date")?,
        pct_change: row.try_get("pct_change")?,
        volume_ratio: row.try_get("volume_ratio")?,
        trigger_close: Decimal::from_str(&trigger_close).unwrap_or_default(),
        expired: row.try_get("expired")?,
    })
}

#[async_trait]
impl DistributionDayRepository for SqliteDistributionDayRepository {
    async fn insert(&self, day: DistributionDay) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO distribution_days (symbol, date, pct_change, volume_ratio, trigger_close, expired)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(symbol, date) DO UPDATE SET
                pct_change = excluded.pct_change,
                volume_ratio = excluded.volume_ratio,
                trigger_close = excluded.trigger_close,
                expired = excluded.expired
            "#,
        )
        .bind(&day.symbol)
        .bind(day.date)
        .bind(day.pct_change)
        .bind(day.volume_ratio)
        .bind(day.trigger_close.to_string())
        .bind(day.expired)
        .execute(&self.database.pool)
        .await?;
        Ok(())
    }

    async fn active_for_symbol(&self, symbol: &str) -> Result<Vec<DistributionDay>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM distribution_days WHERE symbol = ? AND expired = 0 ORDER BY date")
            .bind(symbol)
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_day).collect()
    }

    async fn expire_older_than(&self, symbol: &str, cutoff: NaiveDate) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE distribution_days SET expired = 1 WHERE symbol = ? AND date < ?")
            .bind(symbol)
            .bind(cutoff)
            .execute(&self.database.pool)
            .await?;
        Ok(())
    }
}
