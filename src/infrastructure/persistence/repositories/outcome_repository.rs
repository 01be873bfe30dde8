//! `OutcomeRepository` over sqlite: closed-position learning records
//! written on final close (spec §3 Outcome).

use crate::domain::errors::RepositoryError;
use crate::domain::outcome::{Outcome, OutcomeKind};
use crate::domain::repositories::OutcomeRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{Row, sqlite::SqliteRow};

pub struct SqliteOutcomeRepository {
    database: Database,
}

impl SqliteOutcomeRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn row_to_outcome(row: &SqliteRow) -> Result<Outcome, RepositoryError> {
    let outcome_str: String = row.try_get("outcome")?;
    Ok(Outcome {
        id: row.try_get("id")?,
        position_id: row.try_get("position_id")?,
        symbol: row.try_get("symbol")?,
        entry_date: row.try_get("entry_date")?,
        exit_date: row.try_get("exit_date")?,
        entry_grade: row.try_get("entry_grade")?,
        entry_score: row.try_get::<Option<i64>, _>("entry_score")?.map(|v| v as i32),
        rs_rating: row.try_get::<Option<i64>, _>("rs_rating")?.map(|v| v as u8),
        eps_rating: row.try_get::<Option<i64>, _>("eps_rating")?.map(|v| v as u8),
        pattern: row.try_get("pattern")?,
        base_stage: row.try_get("base_stage")?,
        gross_pct: row.try_get("gross_pct")?,
        holding_days: row.try_get("holding_days")?,
        outcome: outcome_str.parse().unwrap_or(OutcomeKind::Failed),
    })
}

#[async_trait]
impl OutcomeRepository for SqliteOutcomeRepository {
    async fn insert(&self, mut outcome: Outcome) -> Result<Outcome, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO outcomes (
                position_id, symbol, entry_date, exit_date, entry_grade, entry_score,
                rs_rating, eps_rating, pattern, base_stage, gross_pct, holding_days, outcome
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(outcome.position_id)
        .bind(&outcome.symbol)
        .bind(outcome.entry_date)
        .bind(outcome.exit_date)
        .bind(&outcome.entry_grade)
        .bind(outcome.entry_score.map(|v| v as i64))
        .bind(outcome.rs_rating.map(|v| v as i64))
        .bind(outcome.eps_rating.map(|v| v as i64))
        .bind(&outcome.pattern)
        .bind(&outcome.base_stage)
        .bind(outcome.gross_pct)
        .bind(outcome.holding_days)
        .bind(outcome.outcome.to_string())
        .fetch_one(&self.database.pool)
        .await?;

        outcome.id = row.try_get("id")?;
        Ok(outcome)
    }

    async fn list_for_symbol(&self, symbol: &str) -> Result<Vec<Outcome>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM outcomes WHERE symbol = ? ORDER BY exit_date DESC")
            .bind(symbol)
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_outcome).collect()
    }
}
