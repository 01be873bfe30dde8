//! Cooldown windows and display settings for emitted alerts (spec §4.7).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub default_cooldown_minutes: i64,
    /// Per-alert-family override, keyed by `"{TYPE}/{SUBTYPE}"`.
    pub cooldowns: HashMap<String, i64>,
    pub refresh_interval_secs: u64,
    pub warn_pct_above_stop: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            default_cooldown_minutes: 30,
            cooldowns: HashMap::new(),
            refresh_interval_secs: 60,
            warn_pct_above_stop: 2.0,
        }
    }
}

impl AlertsConfig {
    pub fn cooldown_for(&self, alert_type: &str, alert_subtype: &str) -> i64 {
        let key = format!("{alert_type}/{alert_subtype}");
        self.cooldowns
            .get(&key)
            .copied()
            .unwrap_or(self.default_cooldown_minutes)
    }
}
