//! `MarketCalendarFeed` over a JSON trading-session-status endpoint
//! (spec §4.1). `MarketCalendar` falls back to its deterministic NYSE
//! rules whenever this feed is absent or errors, so this adapter only
//! needs to handle the happy path.

use crate::domain::errors::ProviderError;
use crate::domain::ports::{MarketCalendarFeed, SessionStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SessionStatusResponse {
    status: String,
}

pub struct HttpCalendarFeed {
    client: Client,
    url: String,
}

impl HttpCalendarFeed {
    pub fn new(url: String, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client, url }
    }
}

#[async_trait]
impl MarketCalendarFeed for HttpCalendarFeed {
    async fn session_status(&self, date: NaiveDate) -> Result<SessionStatus, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await?
            .json::<SessionStatusResponse>()
            .await?;

        match response.status.to_lowercase().as_str() {
            "closed" => Ok(SessionStatus::Closed),
            "early_close" => Ok(SessionStatus::EarlyClose),
            "open" => Ok(SessionStatus::Open),
            other => Err(ProviderError::Unavailable(format!("unrecognized session status: {other}"))),
        }
    }
}
