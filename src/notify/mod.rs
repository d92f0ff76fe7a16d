// src/notify/mod.rs
//! Notifier boundary: one formatted message per newly matched item.
//! A send is "delivered" only when the channel confirms success.

pub mod discord;
pub mod email;
pub mod slack;
pub mod telegram;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::config::NotifyConfig;
use crate::ingest::types::CandidateItem;
use crate::keywords::MatchResult;
pub(crate) use crate::retry::with_backoff;

pub use discord::DiscordNotifier;
pub use email::EmailNotifier;
pub use slack::SlackNotifier;
pub use telegram::TelegramNotifier;

#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub headline: String,
    pub title: String,
    pub link: String,
    pub matched_group: Option<String>,
    pub matched_keyword: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
    pub footer: String,
}

impl NotificationEvent {
    pub fn from_match(
        cfg: &NotifyConfig,
        item: &CandidateItem,
        m: &MatchResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            headline: cfg.headline.clone(),
            title: item.title.clone(),
            link: item.link.clone(),
            matched_group: m.matched_group.clone(),
            matched_keyword: m.matched_keyword.clone(),
            published_at: item
                .published_at
                .and_then(|ts| i64::try_from(ts).ok())
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            detected_at: now,
            footer: cfg.footer.clone(),
        }
    }

    fn keyword_line(&self) -> Option<String> {
        match (&self.matched_group, &self.matched_keyword) {
            (Some(g), Some(k)) => Some(format!("{g}: {k}")),
            (None, Some(k)) => Some(k.clone()),
            _ => None,
        }
    }

    /// Telegram HTML parse mode. All item text is escaped.
    pub fn render_html(&self) -> String {
        use html_escape::encode_text;
        let mut out = format!(
            "<b>{}</b>\n\n{}\n\n",
            encode_text(&self.headline),
            encode_text(&self.title)
        );
        if !self.link.is_empty() {
            out.push_str(&format!("{}\n\n", encode_text(&self.link)));
        }
        if let Some(k) = self.keyword_line() {
            out.push_str(&format!("<i>{}</i>\n", encode_text(&k)));
        }
        if let Some(p) = self.published_at {
            out.push_str(&format!("<i>{}</i>\n", p.format("%Y-%m-%d %H:%M UTC")));
        }
        if !self.footer.is_empty() {
            out.push_str(&format!("\n{}", encode_text(&self.footer)));
        }
        out.trim_end().to_string()
    }

    pub fn render_plain(&self) -> String {
        let mut out = format!("{}\n\n{}\n", self.headline, self.title);
        if !self.link.is_empty() {
            out.push_str(&format!("{}\n", self.link));
        }
        if let Some(k) = self.keyword_line() {
            out.push_str(&format!("Match: {k}\n"));
        }
        if let Some(p) = self.published_at {
            out.push_str(&format!("Published: {}\n", p.to_rfc3339()));
        }
        out.push_str(&format!("Detected: {}\n", self.detected_at.to_rfc3339()));
        if !self.footer.is_empty() {
            out.push_str(&format!("\n{}\n", self.footer));
        }
        out
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    /// Ok only on confirmed delivery.
    async fn send(&self, ev: &NotificationEvent) -> Result<()>;
}

/// Fans one event out to every configured channel.
/// Delivered when at least one channel confirms; refuses to send when none is configured.
#[derive(Default)]
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Build channels from env credentials. Partially configured channels are
    /// logged as configuration errors and left out.
    pub fn from_env(cfg: &NotifyConfig) -> Self {
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

        match TelegramNotifier::from_env() {
            Ok(Some(t)) => channels.push(Box::new(
                t.with_timeout(cfg.timeout_secs).with_retries(cfg.retries),
            )),
            Ok(None) => tracing::debug!("Telegram disabled (no TELEGRAM_TOKEN/TELEGRAM_CHAT_ID)"),
            Err(e) => tracing::error!("telegram config: {e:#}"),
        }
        if let Ok(url) = std::env::var("DISCORD_WEBHOOK_URL") {
            if !url.trim().is_empty() {
                channels.push(Box::new(
                    DiscordNotifier::new(url)
                        .with_timeout(cfg.timeout_secs)
                        .with_retries(cfg.retries),
                ));
            }
        }
        if let Some(s) = SlackNotifier::from_env() {
            channels.push(Box::new(s.with_timeout(cfg.timeout_secs)));
        }
        match EmailNotifier::from_env() {
            Ok(Some(e)) => channels.push(Box::new(e)),
            Ok(None) => tracing::debug!("email disabled (no SMTP_HOST)"),
            Err(e) => tracing::error!("email config: {e:#}"),
        }

        let names: Vec<&str> = channels.iter().map(|c| c.name()).collect();
        if names.is_empty() {
            tracing::error!("no notification channel configured; matches will not be delivered");
        } else {
            tracing::info!(channels = ?names, "notification channels ready");
        }
        Self { channels }
    }

    pub fn is_configured(&self) -> bool {
        !self.channels.is_empty()
    }
}

#[async_trait::async_trait]
impl Notifier for NotifierMux {
    fn name(&self) -> &'static str {
        "mux"
    }

    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        if self.channels.is_empty() {
            return Err(anyhow!("no notification channel configured"));
        }
        let mut delivered = 0usize;
        for ch in &self.channels {
            match ch.send(ev).await {
                Ok(()) => {
                    delivered += 1;
                    tracing::debug!(channel = ch.name(), "delivered");
                }
                Err(e) => tracing::warn!(channel = ch.name(), "delivery failed: {e:#}"),
            }
        }
        if delivered == 0 {
            return Err(anyhow!(
                "all {} channel(s) failed to deliver",
                self.channels.len()
            ));
        }
        Ok(())
    }
}
