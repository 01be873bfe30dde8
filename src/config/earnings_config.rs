//! Earnings-proximity thresholds consumed by `HealthChecker` (spec §4.8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsConfig {
    pub auto_fetch: bool,
    pub warning_critical_days: i64,
    pub warning_caution_days: i64,
}

impl Default for EarningsConfig {
    fn default() -> Self {
        Self {
            auto_fetch: true,
            warning_critical_days: 5,
            warning_caution_days: 10,
        }
    }
}
