//! Distribution-day detection thresholds (spec §4.6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionDaysConfig {
    /// Maximum day-over-day percent decline to qualify, e.g. -0.2 (spec default).
    pub decline_threshold: f64,
    pub min_volume_increase_pct: f64,
    pub decline_rounding_decimals: u32,
    pub rolling_window_sessions: u32,
    pub expire_on_advance_pct: f64,
    /// Open question per spec §9: off by default, documented separately.
    pub enable_stalling: bool,
}

impl Default for DistributionDaysConfig {
    fn default() -> Self {
        Self {
            decline_threshold: -0.2,
            min_volume_increase_pct: 2.0,
            decline_rounding_decimals: 4,
            rolling_window_sessions: 25,
            expire_on_advance_pct: 5.0,
            enable_stalling: false,
        }
    }
}
