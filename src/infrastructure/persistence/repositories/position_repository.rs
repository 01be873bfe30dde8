//! `PositionRepository` over sqlite: the state machine and change-capture
//! invariants are enforced here, at the persistence boundary, so every
//! caller gets them for free (spec §3, §4.3, §6).

use crate::domain::errors::RepositoryError;
use crate::domain::position::{EntryTranche, ExitTranche, Position, PositionState, TransitionFields, validate_transition};
use crate::domain::position_history::{ChangeSource, FieldDiff, PositionHistoryEntry};
use crate::domain::repositories::PositionRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, sqlite::SqliteRow};
use std::str::FromStr;

pub struct SqlitePositionRepository {
    database: Database,
}

impl SqlitePositionRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or_default()
}

fn row_to_position(row: &SqliteRow) -> Result<Position, RepositoryError> {
    Ok(Position {
        id: row.try_get("id")?,
        symbol: row.try_get("symbol")?,
        portfolio: row.try_get("portfolio")?,
        state: PositionState(row.try_get("state")?),
        e1: EntryTranche {
            shares: dec(row.try_get("e1_shares")?),
            price: dec(row.try_get("e1_price")?),
            date: row.try_get("e1_date")?,
        },
        e2: EntryTranche {
            shares: dec(row.try_get("e2_shares")?),
            price: dec(row.try_get("e2_price")?),
            date: row.try_get("e2_date")?,
        },
        e3: EntryTranche {
            shares: dec(row.try_get("e3_shares")?),
            price: dec(row.try_get("e3_price")?),
            date: row.try_get("e3_date")?,
        },
        tp1: ExitTranche {
            sold: dec(row.try_get("tp1_sold")?),
            price: dec(row.try_get("tp1_price")?),
            date: row.try_get("tp1_date")?,
        },
        tp2: ExitTranche {
            sold: dec(row.try_get("tp2_sold")?),
            price: dec(row.try_get("tp2_price")?),
            date: row.try_get("tp2_date")?,
        },
        total_shares: dec(row.try_get("total_shares")?),
        avg_cost: dec(row.try_get("avg_cost")?),
        current_pnl_pct: row.try_get("current_pnl_pct")?,
        stop_price: row.try_get::<Option<String>, _>("stop_price")?.map(|s| dec(&s)),
        tp1_target: row.try_get::<Option<String>, _>("tp1_target")?.map(|s| dec(&s)),
        tp2_target: row.try_get::<Option<String>, _>("tp2_target")?.map(|s| dec(&s)),
        hard_stop_pct: row.try_get("hard_stop_pct")?,
        tp1_pct: row.try_get("tp1_pct")?,
        tp2_pct: row.try_get("tp2_pct")?,
        pattern: row.try_get("pattern")?,
        base_stage: row.try_get("base_stage")?,
        base_depth: row.try_get("base_depth")?,
        base_length: row.try_get("base_length")?,
        pivot: row.try_get::<Option<String>, _>("pivot")?.map(|s| dec(&s)),
        pivot_set_date: row.try_get("pivot_set_date")?,
        original_pivot: row.try_get::<Option<String>, _>("original_pivot")?.map(|s| dec(&s)),
        rs_rating: row.try_get::<Option<i64>, _>("rs_rating")?.map(|v| v as u8),
        eps_rating: row.try_get::<Option<i64>, _>("eps_rating")?.map(|v| v as u8),
        comp_rating: row.try_get::<Option<i64>, _>("comp_rating")?.map(|v| v as u8),
        ad_rating: row.try_get("ad_rating")?,
        industry_rank: row.try_get::<Option<i64>, _>("industry_rank")?.map(|v| v as u32),
        fund_count: row.try_get::<Option<i64>, _>("fund_count")?.map(|v| v as u32),
        entry_grade: row.try_get("entry_grade")?,
        entry_score: row.try_get::<Option<i64>, _>("entry_score")?.map(|v| v as i32),
        last_price: row.try_get::<Option<String>, _>("last_price")?.map(|s| dec(&s)),
        last_price_time: row.try_get("last_price_time")?,
        avg_volume_50d: row.try_get::<Option<i64>, _>("avg_volume_50d")?.map(|v| v as u64),
        earnings_date: row.try_get("earnings_date")?,
        needs_sheet_sync: row.try_get("needs_sheet_sync")?,
        watching_exited_since: row.try_get("watching_exited_since")?,
        ma_test_count: row.try_get::<i64, _>("ma_test_count")? as u32,
    })
}

/// Apply the state-specific tranche/flag mutations a validated transition
/// implies, mirroring the `(from, to)` match in
/// `domain::position::validate_transition`.
fn apply_transition_fields(position: &mut Position, to: PositionState, fields: &TransitionFields, today: NaiveDate) {
    use PositionState as S;
    let from = position.state;

    match (from, to) {
        (S::WATCHLIST, S::ENTRY1) | (S::WATCHING_EXITED, S::ENTRY1) => {
            position.e1 = EntryTranche {
                shares: fields.e1_shares.unwrap_or_default(),
                price: fields.e1_price.unwrap_or_default(),
                date: Some(today),
            };
            position.stop_price = fields.stop_price;
            position.watching_exited_since = None;
        }
        (S::ENTRY1, S::ENTRY2) => {
            position.e2 = EntryTranche {
                shares: fields.e2_shares.unwrap_or_default(),
                price: fields.e2_price.unwrap_or_default(),
                date: Some(today),
            };
        }
        (S::ENTRY2, S::ENTRY3) => {
            position.e3 = EntryTranche {
                shares: fields.e3_shares.unwrap_or_default(),
                price: fields.e3_price.unwrap_or_default(),
                date: Some(today),
            };
        }
        (S::ENTRY1, S::ENTRY3) => {
            if let (Some(shares), Some(price)) = (fields.e2_shares, fields.e2_price) {
                position.e2 = EntryTranche { shares, price, date: Some(today) };
            }
            if let (Some(shares), Some(price)) = (fields.e3_shares, fields.e3_price) {
                position.e3 = EntryTranche { shares, price, date: Some(today) };
            }
        }
        (S::ENTRY1, S::TP1_TAKEN) | (S::ENTRY2, S::TP1_TAKEN) => {
            position.tp1 = ExitTranche {
                sold: fields.tp1_sold.unwrap_or_default(),
                price: fields.tp1_price.unwrap_or_default(),
                date: Some(today),
            };
        }
        (S::ENTRY2, S::TP2_TAKEN) | (S::ENTRY3, S::TP2_TAKEN) | (S::TP1_TAKEN, S::TP2_TAKEN) => {
            position.tp2 = ExitTranche {
                sold: fields.tp2_sold.unwrap_or_default(),
                price: fields.tp2_price.unwrap_or_default(),
                date: Some(today),
            };
        }
        (S::WATCHING_EXITED, S::WATCHLIST) => {
            if let Some(pivot) = fields.new_pivot {
                position.set_pivot(pivot, today);
            }
            position.watching_exited_since = None;
        }
        (from, S::WATCHING_EXITED)
            if from == S::STOPPED_OUT || from == S::MANUAL_EXIT || from.0 >= S::ENTRY1.0 =>
        {
            // Tranches zeroed on entry to WATCHING_EXITED (spec §8 S3):
            // the position becomes a watch-only record, not a held one.
            // `original_pivot` preserves the former pivot so a later
            // re-entry can detect a pivot retest (spec §4.3).
            position.original_pivot = position.pivot;
            position.e1 = EntryTranche::default();
            position.e2 = EntryTranche::default();
            position.e3 = EntryTranche::default();
            position.tp1 = ExitTranche::default();
            position.tp2 = ExitTranche::default();
            position.stop_price = None;
            position.watching_exited_since = Some(Utc::now());
        }
        _ => {}
    }

    position.state = to;
    position.recalculate_derived();
    // `stop_price` is only ever touched explicitly above (initial entry, or
    // a future manual move) — a transition never recomputes it from
    // avg_cost, so pyramiding into e2/e3 can't silently reset a custom
    // stop. tp1_target/tp2_target track the blended cost basis on every
    // tranche-affecting transition since there's no override for them.
    position.apply_default_targets(true, false, false);
}

macro_rules! diffs {
    ($out:expr, $($name:literal, $old:expr, $new:expr);+ $(;)?) => {
        $( if let Some(d) = FieldDiff::of($name, &$old, &$new) { $out.push(d); } )+
    };
}

fn diff_positions(before: &Position, after: &Position) -> Vec<FieldDiff> {
    let mut out = Vec::new();
    diffs!(out,
        "state", Some(before.state.0), Some(after.state.0);
        "e1_shares", Some(before.e1.shares.to_string()), Some(after.e1.shares.to_string());
        "e1_price", Some(before.e1.price.to_string()), Some(after.e1.price.to_string());
        "e2_shares", Some(before.e2.shares.to_string()), Some(after.e2.shares.to_string());
        "e2_price", Some(before.e2.price.to_string()), Some(after.e2.price.to_string());
        "e3_shares", Some(before.e3.shares.to_string()), Some(after.e3.shares.to_string());
        "e3_price", Some(before.e3.price.to_string()), Some(after.e3.price.to_string());
        "tp1_sold", Some(before.tp1.sold.to_string()), Some(after.tp1.sold.to_string());
        "tp1_price", Some(before.tp1.price.to_string()), Some(after.tp1.price.to_string());
        "tp2_sold", Some(before.tp2.sold.to_string()), Some(after.tp2.sold.to_string());
        "tp2_price", Some(before.tp2.price.to_string()), Some(after.tp2.price.to_string());
        "total_shares", Some(before.total_shares.to_string()), Some(after.total_shares.to_string());
        "avg_cost", Some(before.avg_cost.to_string()), Some(after.avg_cost.to_string());
        "current_pnl_pct", Some(before.current_pnl_pct.to_string()), Some(after.current_pnl_pct.to_string());
        "stop_price", before.stop_price.map(|d| d.to_string()), after.stop_price.map(|d| d.to_string());
        "tp1_target", before.tp1_target.map(|d| d.to_string()), after.tp1_target.map(|d| d.to_string());
        "tp2_target", before.tp2_target.map(|d| d.to_string()), after.tp2_target.map(|d| d.to_string());
        "pivot", before.pivot.map(|d| d.to_string()), after.pivot.map(|d| d.to_string());
        "pivot_set_date", before.pivot_set_date, after.pivot_set_date;
        "original_pivot", before.original_pivot.map(|d| d.to_string()), after.original_pivot.map(|d| d.to_string());
        "rs_rating", before.rs_rating, after.rs_rating;
        "eps_rating", before.eps_rating, after.eps_rating;
        "comp_rating", before.comp_rating, after.comp_rating;
        "entry_grade", before.entry_grade.clone(), after.entry_grade.clone();
        "entry_score", before.entry_score, after.entry_score;
        "last_price", before.last_price.map(|d| d.to_string()), after.last_price.map(|d| d.to_string());
        "earnings_date", before.earnings_date, after.earnings_date;
        "watching_exited_since", before.watching_exited_since.map(|d| d.to_rfc3339()), after.watching_exited_since.map(|d| d.to_rfc3339());
    );
    out
}

impl SqlitePositionRepository {
    async fn persist(&self, position: &Position) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE positions SET
                state = ?, e1_shares = ?, e1_price = ?, e1_date = ?,
                e2_shares = ?, e2_price = ?, e2_date = ?,
                e3_shares = ?, e3_price = ?, e3_date = ?,
                tp1_sold = ?, tp1_price = ?, tp1_date = ?,
                tp2_sold = ?, tp2_price = ?, tp2_date = ?,
                total_shares = ?, avg_cost = ?, current_pnl_pct = ?,
                stop_price = ?, tp1_target = ?, tp2_target = ?,
                hard_stop_pct = ?, tp1_pct = ?, tp2_pct = ?,
                pattern = ?, base_stage = ?, base_depth = ?, base_length = ?,
                pivot = ?, pivot_set_date = ?, original_pivot = ?,
                rs_rating = ?, eps_rating = ?, comp_rating = ?, ad_rating = ?,
                industry_rank = ?, fund_count = ?, entry_grade = ?, entry_score = ?,
                last_price = ?, last_price_time = ?, avg_volume_50d = ?, earnings_date = ?,
                needs_sheet_sync = ?, watching_exited_since = ?, ma_test_count = ?
            WHERE id = ?
            "#,
        )
        .bind(position.state.0)
        .bind(position.e1.shares.to_string())
        .bind(position.e1.price.to_string())
        .bind(position.e1.date)
        .bind(position.e2.shares.to_string())
        .bind(position.e2.price.to_string())
        .bind(position.e2.date)
        .bind(position.e3.shares.to_string())
        .bind(position.e3.price.to_string())
        .bind(position.e3.date)
        .bind(position.tp1.sold.to_string())
        .bind(position.tp1.price.to_string())
        .bind(position.tp1.date)
        .bind(position.tp2.sold.to_string())
        .bind(position.tp2.price.to_string())
        .bind(position.tp2.date)
        .bind(position.total_shares.to_string())
        .bind(position.avg_cost.to_string())
        .bind(position.current_pnl_pct)
        .bind(position.stop_price.map(|d| d.to_string()))
        .bind(position.tp1_target.map(|d| d.to_string()))
        .bind(position.tp2_target.map(|d| d.to_string()))
        .bind(position.hard_stop_pct)
        .bind(position.tp1_pct)
        .bind(position.tp2_pct)
        .bind(&position.pattern)
        .bind(&position.base_stage)
        .bind(position.base_depth)
        .bind(position.base_length)
        .bind(position.pivot.map(|d| d.to_string()))
        .bind(position.pivot_set_date)
        .bind(position.original_pivot.map(|d| d.to_string()))
        .bind(position.rs_rating.map(|v| v as i64))
        .bind(position.eps_rating.map(|v| v as i64))
        .bind(position.comp_rating.map(|v| v as i64))
        .bind(&position.ad_rating)
        .bind(position.industry_rank.map(|v| v as i64))
        .bind(position.fund_count.map(|v| v as i64))
        .bind(&position.entry_grade)
        .bind(position.entry_score.map(|v| v as i64))
        .bind(position.last_price.map(|d| d.to_string()))
        .bind(position.last_price_time)
        .bind(position.avg_volume_50d.map(|v| v as i64))
        .bind(position.earnings_date)
        .bind(position.needs_sheet_sync)
        .bind(position.watching_exited_since)
        .bind(position.ma_test_count as i64)
        .bind(position.id)
        .execute(&self.database.pool)
        .await?;
        Ok(())
    }

    async fn record_history(
        &self,
        position_id: i64,
        diffs: Vec<FieldDiff>,
        source: ChangeSource,
        at: chrono::DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        for diff in diffs {
            let entry = PositionHistoryEntry {
                position_id,
                field_name: diff.field_name.to_string(),
                old_value: diff.old_value,
                new_value: diff.new_value,
                change_source: source,
                changed_at: at,
            };
            sqlx::query(
                "INSERT INTO position_history (position_id, field_name, old_value, new_value, change_source, changed_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(entry.position_id)
            .bind(&entry.field_name)
            .bind(&entry.old_value)
            .bind(&entry.new_value)
            .bind(entry.change_source.to_string())
            .bind(entry.changed_at)
            .execute(&self.database.pool)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PositionRepository for SqlitePositionRepository {
    async fn get(&self, id: i64) -> Result<Position, RepositoryError> {
        let row = sqlx::query("SELECT * FROM positions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.database.pool)
            .await?
            .ok_or(RepositoryError::PositionNotFound(id))?;
        row_to_position(&row)
    }

    async fn get_by_symbol(&self, symbol: &str, portfolio: &str) -> Result<Option<Position>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM positions WHERE symbol = ? AND portfolio = ?")
            .bind(symbol)
            .bind(portfolio)
            .fetch_optional(&self.database.pool)
            .await?;
        row.as_ref().map(row_to_position).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Position>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM positions WHERE state >= 1.0 ORDER BY id")
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_position).collect()
    }

    async fn list_watchlist(&self) -> Result<Vec<Position>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM positions WHERE state = 0.0 ORDER BY id")
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_position).collect()
    }

    async fn list_watching_exited(&self) -> Result<Vec<Position>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM positions WHERE state = -1.5 ORDER BY id")
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_position).collect()
    }

    async fn list_all(&self) -> Result<Vec<Position>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM positions ORDER BY id")
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_position).collect()
    }

    async fn create(&self, mut position: Position) -> Result<Position, RepositoryError> {
        position.recalculate_derived();
        let row = sqlx::query(
            r#"
            INSERT INTO positions (symbol, portfolio, state, hard_stop_pct, tp1_pct, tp2_pct)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&position.symbol)
        .bind(&position.portfolio)
        .bind(position.state.0)
        .bind(position.hard_stop_pct)
        .bind(position.tp1_pct)
        .bind(position.tp2_pct)
        .fetch_one(&self.database.pool)
        .await?;
        position.id = row.try_get("id")?;
        self.persist(&position).await?;
        Ok(position)
    }

    async fn update(
        &self,
        id: i64,
        mutate: Box<dyn FnOnce(&mut Position) + Send>,
        source: ChangeSource,
    ) -> Result<Position, RepositoryError> {
        let before = self.get(id).await?;
        let mut after = before.clone();
        mutate(&mut after);
        after.recalculate_derived();

        let diffs = diff_positions(&before, &after);
        self.persist(&after).await?;
        self.record_history(id, diffs, source, Utc::now()).await?;
        Ok(after)
    }

    async fn transition(&self, id: i64, to: PositionState, fields: TransitionFields) -> Result<Position, RepositoryError> {
        let before = self.get(id).await?;
        validate_transition(before.state, to, &fields)?;

        let mut after = before.clone();
        apply_transition_fields(&mut after, to, &fields, Utc::now().date_naive());

        let diffs = diff_positions(&before, &after);
        self.persist(&after).await?;
        self.record_history(id, diffs, ChangeSource::StateTransition, Utc::now()).await?;
        Ok(after)
    }

    async fn history(&self, id: i64) -> Result<Vec<PositionHistoryEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT position_id, field_name, old_value, new_value, change_source, changed_at FROM position_history WHERE position_id = ? ORDER BY changed_at",
        )
        .bind(id)
        .fetch_all(&self.database.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let source_str: String = row.try_get("change_source")?;
                Ok(PositionHistoryEntry {
                    position_id: row.try_get("position_id")?,
                    field_name: row.try_get("field_name")?,
                    old_value: row.try_get("old_value")?,
                    new_value: row.try_get("new_value")?,
                    change_source: source_str.parse().unwrap_or(ChangeSource::SystemCalc),
                    changed_at: row.try_get("changed_at")?,
                })
            })
            .collect()
    }
}
