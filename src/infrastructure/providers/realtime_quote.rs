//! `RealtimeQuoteProvider` derived entirely from historical daily bars.
//!
//! Vendor "real-time quote" endpoints give bid/ask/last but rarely the
//! moving averages this domain needs alongside them; rather than wiring a
//! second vendor integration just for `ma_21`/`ma_50`/`ma_200`, this
//! provider computes them from the same `HistoricalBarsProvider` used
//! elsewhere (`scoring::indicators::moving_average_series`), treating the
//! latest daily bar's close as `last`/`bid`/`ask` when the market is
//! between bars.

use crate::domain::errors::ProviderError;
use crate::domain::ports::HistoricalBarsProvider;
use crate::domain::types::Quote;
use crate::scoring::indicators::moving_average_series;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::sync::Arc;

pub struct BarsBackedQuoteProvider {
    bars: Arc<dyn HistoricalBarsProvider>,
}

impl BarsBackedQuoteProvider {
    pub fn new(bars: Arc<dyn HistoricalBarsProvider>) -> Self {
        Self { bars }
    }
}

#[async_trait]
impl crate::domain::ports::RealtimeQuoteProvider for BarsBackedQuoteProvider {
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(260);
        let bars = self.bars.bars(symbol, start, end).await?;
        let last_bar = bars.last().ok_or_else(|| ProviderError::NoData(symbol.to_string()))?;

        let ma21 = moving_average_series(&bars, 21);
        let ma50 = moving_average_series(&bars, 50);
        let ma200 = moving_average_series(&bars, 200);
        let to_decimal = |series: &[f64]| series.last().copied().and_then(Decimal::from_f64).unwrap_or_default();

        let avg_volume_50d = if bars.len() >= 2 {
            let window = &bars[bars.len().saturating_sub(50)..];
            (window.iter().map(|b| b.volume).sum::<u64>() / window.len() as u64).max(1)
        } else {
            last_bar.volume.max(1)
        };

        Ok(Quote {
            bid: last_bar.close,
            ask: last_bar.close,
            last: last_bar.close,
            volume: last_bar.volume,
            avg_volume_50d,
            ma_21: to_decimal(&ma21),
            ma_50: to_decimal(&ma50),
            ma_200: to_decimal(&ma200),
            time: Utc::now(),
        })
    }
}
