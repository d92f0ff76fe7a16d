// src/monitor.rs
//! Orchestrator: one run of fetch → extract → dedup → match → notify → persist.
//!
//! History is persisted exactly once per run, also on the no-content aborts,
//! and an identity is recorded only after its notification was confirmed.

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, gauge};
use std::fmt;

use crate::config::{NotifyConfig, SentinelConfig};
use crate::extract::Extractor;
use crate::history::{FileHistoryStore, HistorySet, HistoryStore};
use crate::ingest::dedup_items;
use crate::ingest::fetch::{fetch_first, Fetcher, HttpFetcher};
use crate::ingest::types::IdentityBasis;
use crate::keywords::KeywordMatcher;
use crate::metrics::ensure_metrics_described;
use crate::notify::{NotificationEvent, Notifier, NotifierMux};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    Fetching,
    Extracting,
    Matching,
    Notifying,
    Persisting,
    Done,
    AbortedNoContent,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Start => "start",
            RunState::Fetching => "fetching",
            RunState::Extracting => "extracting",
            RunState::Matching => "matching",
            RunState::Notifying => "notifying",
            RunState::Persisting => "persisting",
            RunState::Done => "done",
            RunState::AbortedNoContent => "aborted_no_content",
        };
        f.write_str(s)
    }
}

/// Aggregate counts for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// `Done` or `AbortedNoContent`.
    pub state: RunState,
    pub source: Option<String>,
    pub strategy: Option<String>,
    pub candidates: usize,
    pub items_seen: usize,
    pub items_matched: usize,
    pub already_notified: usize,
    pub notifications_sent: usize,
    pub notification_failures: usize,
    pub history_size: usize,
    pub history_persisted: bool,
}

impl RunOutcome {
    fn new() -> Self {
        Self {
            state: RunState::Start,
            source: None,
            strategy: None,
            candidates: 0,
            items_seen: 0,
            items_matched: 0,
            already_notified: 0,
            notifications_sent: 0,
            notification_failures: 0,
            history_size: 0,
            history_persisted: false,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.state == RunState::AbortedNoContent
    }
}

pub struct Monitor {
    locations: Vec<String>,
    fetcher: Box<dyn Fetcher>,
    extractor: Extractor,
    matcher: KeywordMatcher,
    notifier: Box<dyn Notifier>,
    store: Box<dyn HistoryStore>,
    identity: IdentityBasis,
    message: NotifyConfig,
}

impl Monitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        locations: Vec<String>,
        fetcher: Box<dyn Fetcher>,
        extractor: Extractor,
        matcher: KeywordMatcher,
        notifier: Box<dyn Notifier>,
        store: Box<dyn HistoryStore>,
        identity: IdentityBasis,
        message: NotifyConfig,
    ) -> Self {
        Self {
            locations,
            fetcher,
            extractor,
            matcher,
            notifier,
            store,
            identity,
            message,
        }
    }

    /// Production wiring: HTTP fetcher, env-configured channels, file history.
    pub fn from_config(cfg: &SentinelConfig) -> Result<Self> {
        let extractor = Extractor::from_config(&cfg.extraction, cfg.source.origin_url()?)?;
        let matcher = KeywordMatcher::new(&cfg.keywords.groups);
        if matcher.is_empty() {
            tracing::warn!("no keywords configured; nothing can match");
        }
        Ok(Self::new(
            cfg.source.locations.clone(),
            Box::new(HttpFetcher::from_config(&cfg.source)?),
            extractor,
            matcher,
            Box::new(NotifierMux::from_env(&cfg.notify)),
            Box::new(FileHistoryStore::new(cfg.history.path.clone())),
            cfg.history.identity,
            cfg.notify.clone(),
        ))
    }

    fn enter(outcome: &mut RunOutcome, next: RunState) {
        tracing::debug!(from = %outcome.state, to = %next, "state");
        outcome.state = next;
    }

    /// One complete run. Never fails: every error has a logged fallback.
    pub async fn run(&self) -> RunOutcome {
        ensure_metrics_described();
        counter!("sentinel_runs_total").increment(1);
        let mut outcome = RunOutcome::new();

        // Unreadable (not missing) history must not be overwritten with a partial set.
        let (mut history, persist_allowed) = match self.store.load().await {
            Ok(h) => (h, true),
            Err(e) => {
                tracing::error!("history load failed, continuing without it: {e:#}");
                (HistorySet::new(), false)
            }
        };

        Self::enter(&mut outcome, RunState::Fetching);
        let doc = match fetch_first(self.fetcher.as_ref(), &self.locations).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("no document: {e:#}");
                return self
                    .finish(outcome, &history, persist_allowed, RunState::AbortedNoContent)
                    .await;
            }
        };
        outcome.source = Some(doc.location.clone());

        Self::enter(&mut outcome, RunState::Extracting);
        let extraction = self.extractor.extract(&doc.body);
        outcome.candidates = extraction.items.len();
        outcome.strategy = extraction.strategy.clone();
        counter!("sentinel_candidates_total").increment(outcome.candidates as u64);
        if extraction.is_empty() {
            tracing::info!(source = %doc.location, "no items found by any strategy");
            return self
                .finish(outcome, &history, persist_allowed, RunState::AbortedNoContent)
                .await;
        }

        let (unique, dropped) = dedup_items(extraction.items, self.identity);
        outcome.items_seen = unique.len();
        counter!("sentinel_items_unique_total").increment(unique.len() as u64);
        tracing::debug!(unique = unique.len(), duplicates = dropped, "dedup done");

        Self::enter(&mut outcome, RunState::Matching);
        for u in &unique {
            let m = self.matcher.match_text(&u.item.searchable_text());
            if !m.matched {
                continue;
            }
            outcome.items_matched += 1;
            counter!("sentinel_matches_total").increment(1);

            if history.contains(&u.identity) {
                outcome.already_notified += 1;
                tracing::debug!(identity = u.identity.short(), "already notified");
                continue;
            }

            Self::enter(&mut outcome, RunState::Notifying);
            tracing::info!(
                identity = u.identity.short(),
                keyword = m.matched_keyword.as_deref().unwrap_or_default(),
                group = m.matched_group.as_deref().unwrap_or_default(),
                title = %u.item.title,
                "new match"
            );
            let ev = NotificationEvent::from_match(&self.message, &u.item, &m, Utc::now());
            match self.notifier.send(&ev).await {
                Ok(()) => {
                    history.record(u.identity.clone());
                    outcome.notifications_sent += 1;
                    counter!("sentinel_notifications_sent_total").increment(1);
                }
                Err(e) => {
                    // not recorded → eligible again next run
                    outcome.notification_failures += 1;
                    counter!("sentinel_notification_failures_total").increment(1);
                    tracing::warn!(identity = u.identity.short(), "notification not delivered: {e:#}");
                }
            }
            Self::enter(&mut outcome, RunState::Matching);
        }

        self.finish(outcome, &history, persist_allowed, RunState::Done)
            .await
    }

    async fn finish(
        &self,
        mut outcome: RunOutcome,
        history: &HistorySet,
        persist_allowed: bool,
        terminal: RunState,
    ) -> RunOutcome {
        Self::enter(&mut outcome, RunState::Persisting);
        if persist_allowed {
            match self.store.persist(history).await {
                Ok(()) => outcome.history_persisted = true,
                Err(e) => tracing::error!("history persist failed (duplicates possible next run): {e:#}"),
            }
        } else {
            tracing::warn!("history persist skipped: prior history could not be read");
        }
        outcome.history_size = history.len();
        gauge!("sentinel_history_size").set(history.len() as f64);
        gauge!("sentinel_last_run_ts").set(Utc::now().timestamp() as f64);

        Self::enter(&mut outcome, terminal);
        tracing::info!(
            state = %outcome.state,
            source = outcome.source.as_deref().unwrap_or("-"),
            strategy = outcome.strategy.as_deref().unwrap_or("-"),
            candidates = outcome.candidates,
            seen = outcome.items_seen,
            matched = outcome.items_matched,
            already_notified = outcome.already_notified,
            sent = outcome.notifications_sent,
            failed = outcome.notification_failures,
            history = outcome.history_size,
            "run finished"
        );
        outcome
    }
}
