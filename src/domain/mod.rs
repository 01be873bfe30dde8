//! Core domain model: types, state machine, and the port/repository traits
//! the rest of the crate is built against (spec §3, §4.2, §4.3).

pub mod alert;
pub mod checker_context;
pub mod errors;
pub mod market_regime;
pub mod outcome;
pub mod ports;
pub mod position;
pub mod position_history;
pub mod repositories;
pub mod types;

pub use alert::{Alert, AlertData, AlertSnapshot, severity_of};
pub use checker_context::PositionContext;
pub use errors::{CheckerError, ConfigError, ProviderError, RepositoryError};
pub use market_regime::{DDayTrend, DistributionDay, MarketPhase, MarketRegimeAlert};
pub use outcome::{Outcome, OutcomeKind};
pub use ports::{HistoricalBarsProvider, MarketCalendarFeed, Notifier, RealtimeQuoteProvider, SentimentProvider, SessionStatus};
pub use position::{EntryTranche, ExitTranche, Position, PositionState, TransitionFields, validate_transition};
pub use position_history::{ChangeSource, FieldDiff, PositionHistoryEntry, reconstruct_snapshots};
pub use repositories::{
    AlertRepository, ConfigRepository, DistributionDayRepository, OutcomeRepository,
    PositionRepository, RegimeRepository,
};
pub use types::{AlertSubtype, AlertType, Bar, FearGreed, FearGreedRating, Grade, Quote, Regime, Severity};
