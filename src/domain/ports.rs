//! Provider interfaces the application core depends on; implemented by
//! `crate::infrastructure::providers` (spec §4.2 "Data-Provider Interfaces").

use crate::domain::errors::ProviderError;
use crate::domain::types::{Bar, FearGreed, Quote};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Real-time (or near-real-time) quote lookup, keyed by ticker symbol.
#[async_trait]
pub trait RealtimeQuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError>;

    /// Batched variant; a default sequential fallback, overridden by
    /// providers whose wire API supports multi-symbol requests natively.
    async fn quotes(&self, symbols: &[String]) -> Vec<(String, Result<Quote, ProviderError>)> {
        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            out.push((symbol.clone(), self.quote(symbol).await));
        }
        out
    }
}

/// Daily OHLCV history, used by the scorer and the regime calculator.
#[async_trait]
pub trait HistoricalBarsProvider: Send + Sync {
    async fn bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError>;
}

/// CNN-style fear & greed index feed, consulted by the regime calculator.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn fear_greed(&self) -> Result<FearGreed, ProviderError>;
}

/// Trading-calendar status feed: open/closed/early-close for a date, with
/// a deterministic offline fallback when the feed is unavailable (spec
/// §4.1 "Calendar" Open Question, resolved via `crate::calendar`).
#[async_trait]
pub trait MarketCalendarFeed: Send + Sync {
    async fn session_status(&self, date: NaiveDate) -> Result<SessionStatus, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Closed,
    EarlyClose,
    Open,
}

/// Outbound alert delivery (email/SMS/push/webhook — the exact channel set
/// is an infrastructure concern; spec §4.7 only requires "one or more
/// notification channels").
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, channel: &str, subject: &str, body: &str) -> Result<(), ProviderError>;
}
