//! `SentimentProvider` over alternative.me's Fear & Greed index. Grounded
//! on `src/infrastructure/sentiment/alternative_me.rs`.

use crate::domain::errors::ProviderError;
use crate::domain::ports::SentimentProvider;
use crate::domain::types::{FearGreed, FearGreedRating};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: String,
    timestamp: String,
}

pub struct AlternativeMeSentimentProvider {
    client: Client,
    url: String,
}

impl AlternativeMeSentimentProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            url: "https://api.alternative.me/fng/".to_string(),
        }
    }
}

#[async_trait]
impl SentimentProvider for AlternativeMeSentimentProvider {
    async fn fear_greed(&self) -> Result<FearGreed, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .json::<FngResponse>()
            .await?;

        let entry = response.data.into_iter().next().ok_or_else(|| ProviderError::NoData("fear_greed".to_string()))?;
        let score: u8 = entry
            .value
            .parse()
            .map_err(|_| ProviderError::Unavailable(format!("unparseable fear/greed value: {}", entry.value)))?;
        let timestamp: i64 = entry
            .timestamp
            .parse()
            .map_err(|_| ProviderError::Unavailable(format!("unparseable fear/greed timestamp: {}", entry.timestamp)))?;
        let date = Utc
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or_else(|| ProviderError::Unavailable("invalid fear/greed timestamp".to_string()))?
            .date_naive();

        Ok(FearGreed {
            date,
            score,
            rating: FearGreedRating::from_score(score),
        })
    }
}
