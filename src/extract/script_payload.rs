// src/extract/script_payload.rs
use anyhow::{anyhow, Context, Result};
use regex::Regex;

use super::{Document, ExtractContext, ExtractionStrategy};
use crate::ingest::types::CandidateItem;

/// Regex over the raw document for pages that ship their content as an
/// embedded script/JSON payload (e.g. channel previews).
///
/// Named groups: `title` (required), `link` and `content` (optional).
/// Captures are JSON-string-unescaped before normalization.
pub struct ScriptPayloadStrategy {
    label: String,
    pattern: Regex,
    max_len: Option<usize>,
}

impl ScriptPayloadStrategy {
    pub fn new(pattern: &str, max_len: Option<usize>) -> Result<Self> {
        let re = Regex::new(pattern).with_context(|| format!("invalid payload regex {pattern:?}"))?;
        if !re.capture_names().flatten().any(|n| n == "title") {
            return Err(anyhow!("payload regex must define a named group `title`"));
        }
        Ok(Self {
            label: "script_payload".to_string(),
            pattern: re,
            max_len,
        })
    }
}

/// `\"`, `\n`, `\u0414` → plain text. Falls back to the raw capture.
fn unescape_json_fragment(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }
    serde_json::from_str::<String>(&format!("\"{s}\"")).unwrap_or_else(|_| s.to_string())
}

impl ExtractionStrategy for ScriptPayloadStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract(&self, doc: &Document<'_>, ctx: &ExtractContext) -> Vec<CandidateItem> {
        let mut out = Vec::new();
        for caps in self.pattern.captures_iter(doc.raw()) {
            let Some(title) = caps.name("title") else {
                continue;
            };
            let title = unescape_json_fragment(title.as_str());
            let link = caps.name("link").map(|m| unescape_json_fragment(m.as_str()));
            let content = caps
                .name("content")
                .map(|m| unescape_json_fragment(m.as_str()))
                .unwrap_or_default();
            if let Some(item) = ctx.finish(&title, link.as_deref(), &content, self.max_len) {
                out.push(item);
            }
        }
        out
    }
}
