use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

use super::{NotificationEvent, Notifier};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    /// `None` when SLACK_WEBHOOK_URL is unset or blank.
    pub fn from_env() -> Option<Self> {
        std::env::var("SLACK_WEBHOOK_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .map(Self::new)
    }

    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        let mut text = format!("*{}*\n{}", ev.headline, ev.title);
        if !ev.link.is_empty() {
            text.push_str(&format!("\n<{}>", ev.link));
        }
        if let Some(k) = &ev.matched_keyword {
            text.push_str(&format!("\nMatch: {k}"));
        }
        let body = serde_json::json!({ "text": text });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("slack post: {}", e.without_url()))?
            .error_for_status()
            .map_err(|e| anyhow!("slack non-2xx: {}", e.without_url()))?;
        Ok(())
    }
}
