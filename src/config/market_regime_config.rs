//! Weights and thresholds for the composite regime score (spec §4.6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeWeights {
    pub ma_position: f64,
    pub momentum: f64,
    pub d_day_penalty_k: f64,
    pub ftd_adjustment: f64,
    pub fear_greed: f64,
}

impl Default for RegimeWeights {
    fn default() -> Self {
        Self {
            ma_position: 0.35,
            momentum: 0.30,
            d_day_penalty_k: 0.08,
            ftd_adjustment: 0.15,
            fear_greed: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketRegimeConfig {
    pub weights: RegimeWeights,
    pub bullish_threshold: f64,
    pub neutral_threshold: f64,
    pub correction_d_day_threshold: u32,
    pub ftd_min_index_gain_pct: f64,
    pub ftd_min_rally_day: u32,
    pub fear_greed_enabled: bool,
}

impl Default for MarketRegimeConfig {
    fn default() -> Self {
        Self {
            weights: RegimeWeights::default(),
            bullish_threshold: 0.8,
            neutral_threshold: 0.5,
            correction_d_day_threshold: 6,
            ftd_min_index_gain_pct: 1.5,
            ftd_min_rally_day: 4,
            fear_greed_enabled: true,
        }
    }
}
