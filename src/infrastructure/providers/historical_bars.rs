//! `HistoricalBarsProvider` over Alpha Vantage's `TIME_SERIES_DAILY`
//! endpoint (spec §4.2).

use crate::config::HistoricalProviderConfig;
use crate::domain::errors::ProviderError;
use crate::domain::ports::HistoricalBarsProvider;
use crate::domain::types::Bar;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

pub struct AlphaVantageBarsProvider {
    client: Client,
    config: HistoricalProviderConfig,
}

impl AlphaVantageBarsProvider {
    pub fn new(config: HistoricalProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[async_trait]
impl HistoricalBarsProvider for AlphaVantageBarsProvider {
    async fn bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, ProviderError> {
        let url = format!(
            "{}/query?function=TIME_SERIES_DAILY&symbol={}&outputsize=full&apikey={}",
            self.config.base_url, symbol, self.config.api_key
        );
        let response = self.client.get(&url).send().await?.json::<DailySeriesResponse>().await?;

        if let Some(note) = response.note {
            tracing::warn!(note, "vendor rate-limit note");
            return Err(ProviderError::RateLimited(self.config.rate_limit_delay_secs));
        }
        let series = response.series.ok_or_else(|| ProviderError::NoData(symbol.to_string()))?;

        let mut bars = Vec::new();
        for (date_str, bar) in series {
            let Ok(date) = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d") else {
                continue;
            };
            if date < start || date > end {
                continue;
            }
            bars.push(Bar {
                date,
                open: Decimal::from_str(&bar.open).unwrap_or_default(),
                high: Decimal::from_str(&bar.high).unwrap_or_default(),
                low: Decimal::from_str(&bar.low).unwrap_or_default(),
                close: Decimal::from_str(&bar.close).unwrap_or_default(),
                volume: bar.volume.parse().unwrap_or_default(),
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
