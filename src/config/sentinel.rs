// src/config/sentinel.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::ingest::types::IdentityBasis;
use crate::retry::MAX_ATTEMPTS;

fn default_locations() -> Vec<String> {
    vec!["https://bolshoi.ru/news".to_string()]
}
fn default_fetch_timeout() -> u64 {
    15
}
fn default_fetch_attempts() -> u8 {
    1
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_min_len() -> usize {
    10
}
fn default_max_len() -> usize {
    300
}
fn default_history_path() -> PathBuf {
    PathBuf::from("seen_ads.txt")
}
fn default_notify_timeout() -> u64 {
    10
}
fn default_notify_attempts() -> u8 {
    3
}
fn default_headline() -> String {
    "New keyword match".to_string()
}
fn default_footer() -> String {
    "Automatic monitoring".to_string()
}
pub(crate) fn default_container_selector() -> String {
    "div, p, li, span".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub source: SourceConfig,
    pub keywords: KeywordsConfig,
    pub extraction: ExtractionConfig,
    pub history: HistoryConfig,
    pub notify: NotifyConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Candidate locations in priority order; first successful fetch wins.
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
    /// Base for relative links. Defaults to the origin of the first location.
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    /// Attempts per location (1 = no retry).
    #[serde(default = "default_fetch_attempts")]
    pub retries: u8,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            origin: None,
            timeout_secs: default_fetch_timeout(),
            retries: default_fetch_attempts(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourceConfig {
    /// Scheme + host (+ port) relative links are resolved against.
    pub fn origin_url(&self) -> Result<Url> {
        let raw = match &self.origin {
            Some(o) => o.as_str(),
            None => self
                .locations
                .first()
                .map(String::as_str)
                .ok_or_else(|| anyhow!("source.locations is empty and no source.origin set"))?,
        };
        let url = Url::parse(raw).with_context(|| format!("invalid source url {raw}"))?;
        let origin = url.origin().ascii_serialization();
        Url::parse(&origin).with_context(|| format!("source url {raw} has no usable origin"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroupConfig {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default)]
    pub groups: Vec<KeywordGroupConfig>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            groups: vec![KeywordGroupConfig {
                name: "program".to_string(),
                keywords: vec!["Доступный Большой".to_string()],
            }],
        }
    }
}

/// One extraction strategy, tried in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// CSS selector: class substrings, tag sets, href patterns.
    Selector {
        selector: String,
        /// Coarse selectors can swallow navigation chrome; they get the length ceiling.
        #[serde(default)]
        coarse: bool,
        #[serde(default)]
        max_len: Option<usize>,
    },
    /// Generic div/span/p containers; always length-capped and skip-word filtered.
    Container {
        #[serde(default = "default_container_selector")]
        selector: String,
        #[serde(default)]
        max_len: Option<usize>,
    },
    /// Regex over the raw document with named groups `title`, `link`, `content`.
    ScriptPayload {
        pattern: String,
        #[serde(default)]
        max_len: Option<usize>,
    },
    /// RSS 2.0 `<item>` elements.
    Rss,
}

fn default_strategies() -> Vec<StrategyConfig> {
    let fine = |s: &str| StrategyConfig::Selector {
        selector: s.to_string(),
        coarse: false,
        max_len: None,
    };
    vec![
        fine(".news-item"),
        fine(".article-item"),
        fine(".news-list-item"),
        StrategyConfig::Selector {
            selector: r#"[class*="news"]"#.to_string(),
            coarse: true,
            max_len: None,
        },
        fine(r#"a[href*="/news/"]"#),
        fine(r#"a[href*="/about/press/"]"#),
    ]
}

fn default_skip_words() -> Vec<String> {
    [
        "меню", "войти", "поиск", "подписаться", "cookie", "menu", "login", "sign in", "search",
        "subscribe",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Text must be strictly longer than this (in chars).
    #[serde(default = "default_min_len")]
    pub min_len: usize,
    /// Ceiling applied to coarse / container strategies.
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    #[serde(default = "default_skip_words")]
    pub skip_words: Vec<String>,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyConfig>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_len: default_min_len(),
            max_len: default_max_len(),
            skip_words: default_skip_words(),
            strategies: default_strategies(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub identity: IdentityBasis,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            identity: IdentityBasis::default(),
        }
    }
}

/// Message layout + delivery knobs. Credentials are read from env only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_headline")]
    pub headline: String,
    #[serde(default = "default_footer")]
    pub footer: String,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_notify_attempts")]
    pub retries: u8,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            headline: default_headline(),
            footer: default_footer(),
            timeout_secs: default_notify_timeout(),
            retries: default_notify_attempts(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus exposition written here after each run (textfile collector).
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}

impl SentinelConfig {
    /// Clamp and clean values after deserialization.
    pub fn sanitize(mut self) -> Self {
        if self.extraction.min_len > self.extraction.max_len {
            // swap to keep a valid interval
            std::mem::swap(&mut self.extraction.min_len, &mut self.extraction.max_len);
        }
        self.source.timeout_secs = self.source.timeout_secs.max(1);
        self.source.retries = self.source.retries.clamp(1, MAX_ATTEMPTS);
        self.notify.timeout_secs = self.notify.timeout_secs.max(1);
        self.notify.retries = self.notify.retries.clamp(1, MAX_ATTEMPTS);

        self.source.locations = self
            .source
            .locations
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        for group in &mut self.keywords.groups {
            group.keywords = clean_list(std::mem::take(&mut group.keywords));
        }
        self.keywords.groups.retain(|g| !g.keywords.is_empty());

        self.extraction.skip_words = clean_list(std::mem::take(&mut self.extraction.skip_words))
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        self
    }
}

/// Trim, drop blanks, dedup keeping first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_lowercase()) {
            out.push(t.to_string());
        }
    }
    out
}
