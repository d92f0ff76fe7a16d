//! history.rs: identities already notified on, persisted between runs.
//!
//! On-disk layout: UTF-8 text, one identity per line, trailing newline per entry,
//! no header. A missing file is an empty history.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

use crate::ingest::types::ItemIdentity;

/// Identities already notified on. Only grows during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySet {
    ids: BTreeSet<ItemIdentity>,
}

impl HistorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ItemIdentity) -> bool {
        self.ids.contains(id)
    }

    /// In-memory only; nothing is written until `HistoryStore::persist`.
    /// Returns false if the identity was already present.
    pub fn record(&mut self, id: ItemIdentity) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Parse the line-oriented file format. Blank lines are ignored.
    pub fn parse(s: &str) -> Self {
        s.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ItemIdentity::from_token)
            .collect()
    }

    /// Serialize as one identity per line, sorted, each newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.ids.len() * 65);
        for id in &self.ids {
            out.push_str(id.as_str());
            out.push('\n');
        }
        out
    }
}

impl FromIterator<ItemIdentity> for HistorySet {
    fn from_iter<T: IntoIterator<Item = ItemIdentity>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Previously persisted identities; an empty set when no prior state exists.
    async fn load(&self) -> Result<HistorySet>;
    /// Full overwrite with `set`.
    async fn persist(&self, set: &HistorySet) -> Result<()>;
}

/// Plain-text file store. Writes go to a sibling temp file that is renamed
/// over the target, so a crash never leaves a half-written history.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn load(&self) -> Result<HistorySet> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => {
                let set = HistorySet::parse(&s);
                tracing::info!(path = %self.path.display(), entries = set.len(), "history loaded");
                Ok(set)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no history file, starting empty");
                Ok(HistorySet::new())
            }
            Err(e) => {
                Err(e).with_context(|| format!("reading history {}", self.path.display()))
            }
        }
    }

    async fn persist(&self, set: &HistorySet) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, set.render())
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), entries = set.len(), "history saved");
        Ok(())
    }
}
