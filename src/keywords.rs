// src/keywords.rs
//! Keyword matcher: case-insensitive substring test over independent keyword groups.

use crate::config::KeywordGroupConfig;
use crate::ingest::canonicalize;

/// Outcome of matching one item. `matched_group`/`matched_keyword` are diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub matched: bool,
    pub matched_group: Option<String>,
    pub matched_keyword: Option<String>,
}

impl MatchResult {
    fn hit(group: &str, keyword: &str) -> Self {
        Self {
            matched: true,
            matched_group: Some(group.to_string()),
            matched_keyword: Some(keyword.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Group {
    name: String,
    /// (original spelling, case-folded needle)
    keywords: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    groups: Vec<Group>,
}

impl KeywordMatcher {
    pub fn new(groups: &[KeywordGroupConfig]) -> Self {
        let groups = groups
            .iter()
            .map(|g| Group {
                name: g.name.clone(),
                keywords: g
                    .keywords
                    .iter()
                    .map(|k| (k.clone(), canonicalize(k)))
                    .filter(|(_, folded)| !folded.is_empty())
                    .collect(),
            })
            .filter(|g| !g.keywords.is_empty())
            .collect();
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Any group matching counts; stops at the first keyword found.
    pub fn match_text(&self, text: &str) -> MatchResult {
        let haystack = canonicalize(text);
        for g in &self.groups {
            for (original, needle) in &g.keywords {
                if haystack.contains(needle.as_str()) {
                    return MatchResult::hit(&g.name, original);
                }
            }
        }
        MatchResult::default()
    }
}
