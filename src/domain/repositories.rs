//! Repository interfaces the application core depends on; implemented by
//! `crate::infrastructure::persistence::repositories` (spec §4.3).

use crate::domain::alert::Alert;
use crate::domain::errors::RepositoryError;
use crate::domain::market_regime::{DistributionDay, MarketRegimeAlert};
use crate::domain::outcome::Outcome;
use crate::domain::position::{Position, PositionState, TransitionFields};
use crate::domain::position_history::{ChangeSource, PositionHistoryEntry};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Positions keyed by id, with the state machine and change-capture
/// invariants applied at the repository boundary (spec §4.3, §3, §6).
#[async_trait]
pub trait PositionRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Position, RepositoryError>;
    async fn get_by_symbol(
        &self,
        symbol: &str,
        portfolio: &str,
    ) -> Result<Option<Position>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<Position>, RepositoryError>;
    async fn list_watchlist(&self) -> Result<Vec<Position>, RepositoryError>;
    async fn list_watching_exited(&self) -> Result<Vec<Position>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Position>, RepositoryError>;

    async fn create(&self, position: Position) -> Result<Position, RepositoryError>;

    /// Apply a field-level update, recomputing derived fields and emitting
    /// `PositionHistory` rows for every changed field (spec §4.3 "change
    /// capture", testable property 3).
    async fn update(
        &self,
        id: i64,
        mutate: Box<dyn FnOnce(&mut Position) + Send>,
        source: ChangeSource,
    ) -> Result<Position, RepositoryError>;

    /// Validate and apply a state transition (spec §6 state machine table).
    async fn transition(
        &self,
        id: i64,
        to: PositionState,
        fields: TransitionFields,
    ) -> Result<Position, RepositoryError>;

    async fn history(&self, id: i64) -> Result<Vec<PositionHistoryEntry>, RepositoryError>;
}

/// Emitted alerts, keyed by id (spec §4.3, §3 Alert).
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: Alert) -> Result<Alert, RepositoryError>;
    async fn latest_for_position(
        &self,
        position_id: i64,
        limit: u32,
    ) -> Result<Vec<Alert>, RepositoryError>;
    async fn latest_for_symbols(
        &self,
        symbols: &[String],
        limit: u32,
    ) -> Result<Vec<Alert>, RepositoryError>;
    async fn acknowledge(&self, id: i64) -> Result<(), RepositoryError>;

    /// Most recent alert of a given `(position_id, alert_type, alert_subtype)`
    /// combination, used to enforce per-alert-type cooldowns (spec §4.7).
    async fn latest_of_kind(
        &self,
        position_id: i64,
        alert_type: &str,
        alert_subtype: &str,
    ) -> Result<Option<Alert>, RepositoryError>;
}

/// Market-regime history, one row per trading date (spec §4.3, §3).
#[async_trait]
pub trait RegimeRepository: Send + Sync {
    async fn upsert(&self, alert: MarketRegimeAlert) -> Result<(), RepositoryError>;
    async fn latest(&self) -> Result<Option<MarketRegimeAlert>, RepositoryError>;
    async fn for_date(&self, date: NaiveDate) -> Result<Option<MarketRegimeAlert>, RepositoryError>;
    async fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketRegimeAlert>, RepositoryError>;
}

/// Distribution-day ledger, feeding the 25-session rolling-window count
/// (spec §4.6).
#[async_trait]
pub trait DistributionDayRepository: Send + Sync {
    async fn insert(&self, day: DistributionDay) -> Result<(), RepositoryError>;
    async fn active_for_symbol(&self, symbol: &str) -> Result<Vec<DistributionDay>, RepositoryError>;
    async fn expire_older_than(&self, symbol: &str, cutoff: NaiveDate) -> Result<(), RepositoryError>;
}

/// Closed-position learning records (spec §4.3, §3 Outcome).
#[async_trait]
pub trait OutcomeRepository: Send + Sync {
    async fn insert(&self, outcome: Outcome) -> Result<Outcome, RepositoryError>;
    async fn list_for_symbol(&self, symbol: &str) -> Result<Vec<Outcome>, RepositoryError>;
}

/// Key-value persisted configuration overrides (spec §4.1 "learned
/// weights" / runtime-tunable scoring bonuses).
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
}
