// src/ingest/mod.rs
//! Text normalization, identity hashing and in-run deduplication of extracted items.
pub mod fetch;
pub mod types;

use crate::ingest::types::{CandidateItem, IdentityBasis, ItemIdentity};
use once_cell::sync::OnceCell;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Normalize display text: decode entities, strip stray tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (payload strategies may capture inline markup)
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    if out.contains('<') {
        out = re_tags.replace_all(&out, " ").to_string();
    }

    // 3) Collapse whitespace (incl. NBSP)
    collapse_whitespace(&out)
}

/// Collapse any run of Unicode whitespace into one ASCII space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity canonical form: Unicode lowercase + whitespace collapse.
pub fn canonicalize(s: &str) -> String {
    collapse_whitespace(&s.to_lowercase())
}

/// Canonical string the identity hash (and in-run dedup) is computed from.
pub fn identity_basis(item: &CandidateItem, basis: IdentityBasis) -> String {
    match basis {
        IdentityBasis::TitleLink => {
            format!("{}\n{}", canonicalize(&item.title), canonicalize(&item.link))
        }
        IdentityBasis::Content => canonicalize(&item.content),
        IdentityBasis::TitleContent => {
            format!("{}\n{}", canonicalize(&item.title), canonicalize(&item.content))
        }
    }
}

pub fn item_identity(item: &CandidateItem, basis: IdentityBasis) -> ItemIdentity {
    let canonical = identity_basis(item, basis);
    let digest = Sha256::digest(canonical.as_bytes());
    ItemIdentity::from_token(hex::encode(digest))
}

/// An item that survived dedup, paired with its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueItem {
    pub item: CandidateItem,
    pub identity: ItemIdentity,
}

/// Drop items whose canonical identity basis was already seen in this pass.
/// First-seen order is kept. Returns (unique, duplicates_removed).
pub fn dedup_items(raw: Vec<CandidateItem>, basis: IdentityBasis) -> (Vec<UniqueItem>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut keep = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for item in raw {
        let canonical = identity_basis(&item, basis);
        if !seen.insert(canonical) {
            dropped += 1;
            continue;
        }
        let identity = item_identity(&item, basis);
        keep.push(UniqueItem { item, identity });
    }

    (keep, dropped)
}
