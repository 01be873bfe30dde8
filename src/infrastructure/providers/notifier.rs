//! `Notifier` that posts alert text to a named webhook URL (spec §4.6
//! "delivery channels").

use crate::config::NotifierConfig;
use crate::domain::errors::ProviderError;
use crate::domain::ports::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

pub struct WebhookNotifier {
    client: Client,
    config: NotifierConfig,
}

impl WebhookNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, channel: &str, subject: &str, body: &str) -> Result<(), ProviderError> {
        let Some(url) = self.config.webhooks.get(channel) else {
            warn!(channel, "no webhook configured for channel, dropping notification");
            return Ok(());
        };
        let payload = json!({ "subject": subject, "body": body });
        self.client.post(url).json(&payload).send().await?;
        Ok(())
    }
}
