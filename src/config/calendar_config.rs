//! Calendar feed configuration (spec §4.1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub status_feed_url: Option<String>,
    pub status_ttl_secs: u64,
    pub holidays_ttl_secs: u64,
    pub timeout_ms: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            status_feed_url: None,
            status_ttl_secs: 60,
            holidays_ttl_secs: 3600,
            timeout_ms: 5_000,
        }
    }
}
