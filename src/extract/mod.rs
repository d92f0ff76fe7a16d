// src/extract/mod.rs
//! Extractor: raw document text → candidate items.
//!
//! Strategies are tried in priority order and the first one yielding at least
//! one valid item wins; later strategies are never consulted for that run.
//! An empty result is a legitimate "no content" outcome, not an error.

pub mod container;
pub mod rss;
pub mod script_payload;
pub mod selector;

use anyhow::Result;
use metrics::histogram;
use once_cell::unsync::OnceCell;
use scraper::Html;
use url::Url;

use crate::config::{ExtractionConfig, StrategyConfig};
use crate::ingest::normalize_text;
use crate::ingest::types::CandidateItem;

pub use container::ContainerStrategy;
pub use rss::RssStrategy;
pub use script_payload::ScriptPayloadStrategy;
pub use selector::SelectorStrategy;

/// Raw document text with a lazily parsed HTML tree, shared by all strategies of one pass.
pub struct Document<'a> {
    raw: &'a str,
    html: OnceCell<Html>,
}

impl<'a> Document<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            html: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn html(&self) -> &Html {
        self.html.get_or_init(|| Html::parse_document(self.raw))
    }
}

/// Settings every strategy validates against.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub origin: Url,
    /// Text must be strictly longer than this (chars).
    pub min_len: usize,
    /// Ceiling for coarse strategies that can ingest navigation chrome.
    pub max_len: usize,
    /// Lowercase substrings marking navigation/utility text.
    pub skip_words: Vec<String>,
}

impl ExtractContext {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            min_len: 10,
            max_len: 300,
            skip_words: Vec::new(),
        }
    }

    /// Normalize raw fields and validate; `None` when the title is too short,
    /// or longer than `max_len` when a ceiling applies.
    pub fn finish(
        &self,
        raw_title: &str,
        raw_link: Option<&str>,
        raw_content: &str,
        max_len: Option<usize>,
    ) -> Option<CandidateItem> {
        let title = normalize_text(raw_title);
        if !passes_length(&title, self.min_len, max_len) {
            return None;
        }
        let mut content = normalize_text(raw_content);
        if content.is_empty() {
            content = title.clone();
        }
        let link = raw_link
            .map(|l| resolve_link(&self.origin, l))
            .unwrap_or_default();
        Some(CandidateItem {
            title,
            link,
            content,
            published_at: None,
        })
    }

    pub fn has_skip_word(&self, text: &str) -> bool {
        if self.skip_words.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.skip_words.iter().any(|w| lower.contains(w.as_str()))
    }
}

fn passes_length(text: &str, min_len: usize, max_len: Option<usize>) -> bool {
    let n = text.chars().count();
    n > min_len && max_len.map_or(true, |max| n <= max)
}

/// Resolve an href against the source origin.
/// `/path` → origin + path; bare `path` → origin + "/" + path; absolute → unchanged.
pub fn resolve_link(origin: &Url, raw: &str) -> String {
    let link = raw.trim();
    if link.is_empty() || link.starts_with('#') {
        return String::new();
    }
    let lower = link.to_ascii_lowercase();
    if lower.starts_with("javascript:") {
        return String::new();
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return link.to_string();
    }
    if link.starts_with("//") {
        return format!("{}:{}", origin.scheme(), link);
    }
    let base = origin.as_str().trim_end_matches('/');
    if link.starts_with('/') {
        format!("{base}{link}")
    } else {
        format!("{base}/{link}")
    }
}

/// One heuristic method for locating candidate items in a document.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &str;
    /// Valid items only; an empty vec means "nothing here, try the next strategy".
    fn extract(&self, doc: &Document<'_>, ctx: &ExtractContext) -> Vec<CandidateItem>;
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Name of the winning strategy, if any yielded items.
    pub strategy: Option<String>,
    pub items: Vec<CandidateItem>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub struct Extractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    ctx: ExtractContext,
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>, ctx: ExtractContext) -> Self {
        Self { strategies, ctx }
    }

    /// Build the strategy chain from config. Invalid selectors/patterns are config errors.
    pub fn from_config(cfg: &ExtractionConfig, origin: Url) -> Result<Self> {
        let ctx = ExtractContext {
            origin,
            min_len: cfg.min_len,
            max_len: cfg.max_len,
            skip_words: cfg.skip_words.iter().map(|w| w.to_lowercase()).collect(),
        };
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> =
            Vec::with_capacity(cfg.strategies.len());
        for (i, sc) in cfg.strategies.iter().enumerate() {
            let s: Box<dyn ExtractionStrategy> = match sc {
                StrategyConfig::Selector {
                    selector,
                    coarse,
                    max_len,
                } => {
                    let ceiling = max_len.or(coarse.then_some(cfg.max_len));
                    Box::new(SelectorStrategy::new(selector, ceiling)?)
                }
                StrategyConfig::Container { selector, max_len } => Box::new(
                    ContainerStrategy::new(selector, max_len.unwrap_or(cfg.max_len))?,
                ),
                StrategyConfig::ScriptPayload { pattern, max_len } => {
                    Box::new(ScriptPayloadStrategy::new(pattern, *max_len)?)
                }
                StrategyConfig::Rss => Box::new(RssStrategy),
            };
            tracing::debug!(index = i, strategy = s.name(), "strategy registered");
            strategies.push(s);
        }
        if strategies.is_empty() {
            anyhow::bail!("extraction.strategies is empty");
        }
        Ok(Self::new(strategies, ctx))
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First strategy with ≥1 valid item wins.
    pub fn extract(&self, raw: &str) -> Extraction {
        let t0 = std::time::Instant::now();
        let doc = Document::new(raw);
        let mut out = Extraction::default();

        for s in &self.strategies {
            let items = s.extract(&doc, &self.ctx);
            if items.is_empty() {
                tracing::debug!(strategy = s.name(), "strategy yielded nothing");
                continue;
            }
            tracing::info!(strategy = s.name(), items = items.len(), "strategy matched");
            out = Extraction {
                strategy: Some(s.name().to_string()),
                items,
            };
            break;
        }

        histogram!("sentinel_extract_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }
}
