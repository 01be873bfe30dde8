use thiserror::Error;

/// Errors surfaced by repository operations (§7 "Database error").
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("position not found: {0}")]
    PositionNotFound(i64),

    #[error("invalid state transition {from} -> {to}")]
    InvalidTransition { from: f64, to: f64 },

    #[error("transition {from} -> {to} missing required field: {field}")]
    MissingTransitionField {
        from: f64,
        to: f64,
        field: &'static str,
    },

    #[error("transition {0} -> {1} is not legal from this state")]
    IllegalTransition(f64, f64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from provider calls (quotes, historical bars, sentiment, calendar
/// feed). Transient errors are retried at the next worker cycle (§7).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider timed out after {0}ms")]
    Timeout(u64),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("no data for symbol {0}")]
    NoData(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration errors always fail fast at startup, never at runtime (§7).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration key: {0}")]
    MissingKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("malformed config file {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("malformed scoring rules: {0}")]
    MalformedScoring(String),
}

/// Checker-internal errors are caught, logged with checker name and symbol,
/// and counted; they never stop the other checkers (§7, §4.8).
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("checker {checker} failed for {symbol}: {reason}")]
    Internal {
        checker: &'static str,
        symbol: String,
        reason: String,
    },
}
