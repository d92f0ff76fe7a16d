// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// One piece of extracted content before dedup.
/// `content` is the superset used for keyword search; `link` is absolute or empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CandidateItem {
    pub title: String,
    pub link: String,
    pub content: String,
    /// Unix seconds, only known for feed-like sources.
    #[serde(default)]
    pub published_at: Option<u64>,
}

impl CandidateItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            content: content.into(),
            published_at: None,
        }
    }

    /// Title + content, the text the keyword matcher scans.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

/// Which fields feed the identity hash. Fixed per deployment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityBasis {
    #[default]
    TitleLink,
    Content,
    TitleContent,
}

/// Hex SHA-256 of an item's canonical identity basis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemIdentity(String);

impl ItemIdentity {
    /// Wraps an already-computed token (e.g. a line read back from the history file).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
