//! Vendor connection settings: realtime quotes, historical bars, webhook
//! notifier, and the SQL store (spec §6 "Configuration surface").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "canslim_monitor.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub rate_limit_delay_secs: u64,
}

impl Default for HistoricalProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.alphavantage.co".to_string(),
            timeout_ms: 30_000,
            rate_limit_delay_secs: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub webhooks: std::collections::HashMap<String, String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhooks: std::collections::HashMap::new(),
        }
    }
}
