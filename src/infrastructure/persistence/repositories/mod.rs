pub mod alert_repository;
pub mod config_repository;
pub mod distribution_day_repository;
pub mod outcome_repository;
pub mod position_repository;
pub mod regime_repository;

pub use alert_repository::SqliteAlertRepository;
pub use config_repository::SqliteConfigRepository;
pub use distribution_day_repository::SqliteDistributionDayRepository;
pub use outcome_repository::SqliteOutcomeRepository;
pub use position_repository::SqlitePositionRepository;
pub use regime_repository::SqliteRegimeRepository;
