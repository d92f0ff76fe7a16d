use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{with_backoff, NotificationEvent, Notifier};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API `sendMessage` (HTML parse mode).
#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    api_base: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 1,
        }
    }

    /// `Ok(None)` when neither credential is set; an error when only one is.
    /// `TELEGRAM_API_BASE` points at a self-hosted Bot API server.
    pub fn from_env() -> Result<Option<Self>> {
        let token = non_empty_env("TELEGRAM_TOKEN");
        let chat_id = non_empty_env("TELEGRAM_CHAT_ID");
        match (token, chat_id) {
            (Some(t), Some(c)) => {
                let notifier = Self::new(t, c);
                Ok(Some(match non_empty_env("TELEGRAM_API_BASE") {
                    Some(base) => notifier.with_api_base(base),
                    None => notifier,
                }))
            }
            (None, None) => Ok(None),
            (Some(_), None) => Err(anyhow!("TELEGRAM_CHAT_ID missing (TELEGRAM_TOKEN is set)")),
            (None, Some(_)) => Err(anyhow!("TELEGRAM_TOKEN missing (TELEGRAM_CHAT_ID is set)")),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }

    async fn send_once(&self, text: &str) -> Result<()> {
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
        ];
        // Never log the endpoint: it embeds the bot token.
        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| anyhow!("telegram request failed: {}", e.without_url()))?;
        let status = rsp.status();
        let body: TelegramResponse = rsp
            .json()
            .await
            .with_context(|| format!("telegram response ({status}) is not JSON"))?;
        if !status.is_success() || !body.ok {
            bail!(
                "telegram error {status}: {}",
                body.description.unwrap_or_default()
            );
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        let text = ev.render_html();
        with_backoff(self.max_retries, || self.send_once(&text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[serial_test::serial]
    #[test]
    fn credentials_must_come_in_pairs() {
        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("TELEGRAM_CHAT_ID");
        env::remove_var("TELEGRAM_API_BASE");
        assert!(TelegramNotifier::from_env().unwrap().is_none());

        env::set_var("TELEGRAM_TOKEN", "123:abc");
        assert!(TelegramNotifier::from_env().is_err());

        env::set_var("TELEGRAM_CHAT_ID", "-10042");
        let t = TelegramNotifier::from_env().unwrap().unwrap();
        assert_eq!(t.endpoint(), "https://api.telegram.org/bot123:abc/sendMessage");

        env::set_var("TELEGRAM_API_BASE", "http://localhost:8081/");
        let t = TelegramNotifier::from_env().unwrap().unwrap();
        assert_eq!(t.endpoint(), "http://localhost:8081/bot123:abc/sendMessage");

        env::remove_var("TELEGRAM_API_BASE");
        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("TELEGRAM_CHAT_ID");
    }
}
