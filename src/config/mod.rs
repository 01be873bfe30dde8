//! Configuration module for the monitoring service.
//!
//! Tunables live in a single hierarchical config (spec §6 "Configuration
//! surface"), loaded with precedence CLI override > user config file >
//! default config file. Organized by domain, mirroring the component each
//! sub-config feeds.

mod alerts_config;
mod calendar_config;
mod checkers_config;
mod distribution_days_config;
mod earnings_config;
mod market_regime_config;
mod position_sizing_config;
mod providers_config;
mod scoring_config;

pub use alerts_config::AlertsConfig;
pub use calendar_config::CalendarConfig;
pub use checkers_config::{
    AltEntryCheckerConfig, BreakoutCheckerConfig, CheckersConfig, HealthCheckerConfig,
    MaCheckerConfig, ProfitCheckerConfig, PyramidCheckerConfig, StopCheckerConfig,
};
pub use distribution_days_config::DistributionDaysConfig;
pub use earnings_config::EarningsConfig;
pub use market_regime_config::{MarketRegimeConfig, RegimeWeights};
pub use position_sizing_config::PositionSizingConfig;
pub use providers_config::{DatabaseConfig, HistoricalProviderConfig, NotifierConfig};
pub use scoring_config::ScoringConfig;

use crate::domain::errors::ConfigError;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command-line overrides. Anything left unset here falls through to the
/// user config file, then the default config file (spec §6 precedence).
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "CAN-SLIM position monitoring service", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file overriding the bundled defaults.
    #[arg(long, env = "CANSLIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override `database.path`.
    #[arg(long)]
    pub database_path: Option<String>,

    /// Run a single evaluation cycle per worker and exit (used by tests and
    /// `--once` smoke runs instead of the long-lived daemon loop).
    #[arg(long)]
    pub once: bool,

    /// Path to the supervisor IPC socket.
    #[arg(long)]
    pub ipc_socket: Option<PathBuf>,
}

/// The full, assembled configuration tree (spec §6 "Configuration surface").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub historical_provider: HistoricalProviderConfig,
    pub notifier: NotifierConfig,
    pub calendar: CalendarConfig,
    pub distribution_days: DistributionDaysConfig,
    pub market_regime: MarketRegimeConfig,
    pub alerts: AlertsConfig,
    pub earnings: EarningsConfig,
    pub position_sizing: PositionSizingConfig,
    pub scoring: ScoringConfig,
    pub checkers: CheckersConfig,
    pub ipc_socket_path: String,

    /// Days a position may sit in `WATCHING_EXITED` before the
    /// `PositionWorker` auto-closes it to `STOPPED_OUT` (spec §6, scenario
    /// S3 "expire_watching_exited").
    pub watching_exited_expiry_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            historical_provider: HistoricalProviderConfig::default(),
            notifier: NotifierConfig::default(),
            calendar: CalendarConfig::default(),
            distribution_days: DistributionDaysConfig::default(),
            market_regime: MarketRegimeConfig::default(),
            alerts: AlertsConfig::default(),
            earnings: EarningsConfig::default(),
            position_sizing: PositionSizingConfig::default(),
            scoring: ScoringConfig::default(),
            checkers: CheckersConfig::default(),
            ipc_socket_path: "/tmp/canslim-monitor.sock".to_string(),
            watching_exited_expiry_days: 60,
        }
    }
}

impl Config {
    /// Load defaults, merge a user config file if present, then apply CLI
    /// overrides. Malformed config files fail fast (spec §7 "Configuration
    /// error ... fail fast at startup; never at runtime").
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = &cli.config {
            config = Self::merge_file(config, path)?;
        } else if let Some(path) = Self::default_user_path() {
            if path.exists() {
                config = Self::merge_file(config, &path)?;
            }
        }

        if let Some(db_path) = &cli.database_path {
            config.database.path = db_path.clone();
        }
        if let Some(socket) = &cli.ipc_socket {
            config.ipc_socket_path = socket.to_string_lossy().into_owned();
        }

        Ok(config)
    }

    fn merge_file(base: Config, path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let overlay: Config = toml::from_str(&contents).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let _ = base;
        Ok(overlay)
    }

    fn default_user_path() -> Option<PathBuf> {
        dirs_next_config_dir().map(|p| p.join("canslim-monitor").join("config.toml"))
    }
}

/// Tiny, dependency-free stand-in for a user config directory lookup.
/// Avoids pulling in `dirs`/`directories` purely for one path join.
fn dirs_next_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cli = Cli::default();
        let config = Config::load(&cli).expect("defaults should always load");
        assert_eq!(config.database.path, "canslim_monitor.db");
        assert_eq!(config.scoring.grades.a_plus, 20);
    }

    #[test]
    fn cli_database_path_overrides_default() {
        let cli = Cli {
            database_path: Some("/tmp/other.db".to_string()),
            ..Default::default()
        };
        let config = Config::load(&cli).expect("should load");
        assert_eq!(config.database.path, "/tmp/other.db");
    }

    #[test]
    fn malformed_user_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    fn grade_allocation_table_matches_spec() {
        use crate::domain::types::Grade;
        let sizing = PositionSizingConfig::default();
        assert_eq!(sizing.allocation_for(Grade::APlus), 50.0);
        assert_eq!(sizing.allocation_for(Grade::C), 20.0);
        assert_eq!(sizing.allocation_for(Grade::F), 0.0);
    }
}
