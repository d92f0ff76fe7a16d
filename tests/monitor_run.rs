// tests/monitor_run.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use keyword_sentinel::config::{ExtractionConfig, KeywordGroupConfig, NotifyConfig};
use keyword_sentinel::extract::Extractor;
use keyword_sentinel::history::{FileHistoryStore, HistorySet, HistoryStore};
use keyword_sentinel::ingest::fetch::Fetcher;
use keyword_sentinel::keywords::KeywordMatcher;
use keyword_sentinel::{IdentityBasis, Monitor, NotificationEvent, Notifier, RunState};
use std::sync::{Arc, Mutex};
use url::Url;

const NEWS: &str = include_str!("fixtures/news.html");
const EMPTY: &str = include_str!("fixtures/empty.html");

/// Serves one fixed body for every location, or fails everything.
struct StaticFetcher(Option<&'static str>);

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, _location: &str) -> Result<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| anyhow!("connection refused"))
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    fail: bool,
    sent: Arc<Mutex<Vec<NotificationEvent>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        if self.fail {
            return Err(anyhow!("telegram 502"));
        }
        self.sent.lock().unwrap().push(ev.clone());
        Ok(())
    }
}

/// In-memory store; `persisted` holds what the last persist wrote.
#[derive(Clone, Default)]
struct MemoryStore {
    initial: HistorySet,
    persisted: Arc<Mutex<Option<HistorySet>>>,
    fail_load: bool,
    fail_persist: bool,
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn load(&self) -> Result<HistorySet> {
        if self.fail_load {
            return Err(anyhow!("permission denied"));
        }
        Ok(self.initial.clone())
    }
    async fn persist(&self, set: &HistorySet) -> Result<()> {
        if self.fail_persist {
            return Err(anyhow!("disk full"));
        }
        *self.persisted.lock().unwrap() = Some(set.clone());
        Ok(())
    }
}

fn matcher() -> KeywordMatcher {
    KeywordMatcher::new(&[KeywordGroupConfig {
        name: "program".into(),
        keywords: vec!["доступный большой".into()],
    }])
}

fn extractor() -> Extractor {
    Extractor::from_config(
        &ExtractionConfig::default(),
        Url::parse("https://bolshoi.ru").unwrap(),
    )
    .unwrap()
}

fn monitor(
    body: Option<&'static str>,
    notifier: RecordingNotifier,
    store: Box<dyn HistoryStore>,
) -> Monitor {
    Monitor::new(
        vec![
            "https://bolshoi.ru/news".to_string(),
            "https://bolshoi.ru/about/press".to_string(),
        ],
        Box::new(StaticFetcher(body)),
        extractor(),
        matcher(),
        Box::new(notifier),
        store,
        IdentityBasis::TitleLink,
        NotifyConfig::default(),
    )
}

#[tokio::test]
async fn fresh_history_sends_one_notification_with_absolute_link() {
    let notifier = RecordingNotifier::default();
    let store = MemoryStore::default();
    let out = monitor(Some(NEWS), notifier.clone(), Box::new(store.clone()))
        .run()
        .await;

    assert_eq!(out.state, RunState::Done);
    assert_eq!(out.items_seen, 2);
    assert_eq!(out.items_matched, 1);
    assert_eq!(out.notifications_sent, 1);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].link, "https://bolshoi.ru/about/press/x");
    assert_eq!(sent[0].matched_keyword.as_deref(), Some("доступный большой"));

    let persisted = store.persisted.lock().unwrap().clone().unwrap();
    assert_eq!(persisted.len(), 1);
}

#[tokio::test]
async fn second_run_with_persisted_history_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen_ads.txt");

    let first = RecordingNotifier::default();
    let out1 = monitor(Some(NEWS), first.clone(), Box::new(FileHistoryStore::new(&path)))
        .run()
        .await;
    assert_eq!(out1.notifications_sent, 1);
    let after_first = FileHistoryStore::new(&path).load().await.unwrap();

    let second = RecordingNotifier::default();
    let out2 = monitor(Some(NEWS), second.clone(), Box::new(FileHistoryStore::new(&path)))
        .run()
        .await;
    assert_eq!(out2.notifications_sent, 0);
    assert_eq!(out2.already_notified, 1);
    assert!(second.sent.lock().unwrap().is_empty());

    let after_second = FileHistoryStore::new(&path).load().await.unwrap();
    assert_eq!(after_first, after_second);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.ends_with('\n'));
    assert_eq!(raw.lines().next().unwrap().len(), 64);
}

#[tokio::test]
async fn failed_delivery_is_not_recorded() {
    let notifier = RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    };
    let store = MemoryStore::default();
    let out = monitor(Some(NEWS), notifier, Box::new(store.clone()))
        .run()
        .await;

    assert_eq!(out.state, RunState::Done);
    assert_eq!(out.items_matched, 1);
    assert_eq!(out.notifications_sent, 0);
    assert_eq!(out.notification_failures, 1);
    assert!(store.persisted.lock().unwrap().clone().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_failure_aborts_but_keeps_history() {
    let prior: HistorySet = HistorySet::parse("abc\ndef\n");
    let store = MemoryStore {
        initial: prior.clone(),
        ..MemoryStore::default()
    };
    let notifier = RecordingNotifier::default();
    let out = monitor(None, notifier.clone(), Box::new(store.clone()))
        .run()
        .await;

    assert_eq!(out.state, RunState::AbortedNoContent);
    assert!(out.history_persisted);
    assert!(notifier.sent.lock().unwrap().is_empty());
    assert_eq!(store.persisted.lock().unwrap().clone().unwrap(), prior);
}

#[tokio::test]
async fn no_valid_items_aborts_without_notifications() {
    let prior: HistorySet = HistorySet::parse("abc\n");
    let store = MemoryStore {
        initial: prior.clone(),
        ..MemoryStore::default()
    };
    let notifier = RecordingNotifier::default();
    let out = monitor(Some(EMPTY), notifier.clone(), Box::new(store.clone()))
        .run()
        .await;

    assert_eq!(out.state, RunState::AbortedNoContent);
    assert_eq!(out.candidates, 0);
    assert_eq!(out.notifications_sent, 0);
    assert_eq!(store.persisted.lock().unwrap().clone().unwrap(), prior);
}

#[tokio::test]
async fn persist_failure_still_completes_run() {
    let store = MemoryStore {
        fail_persist: true,
        ..MemoryStore::default()
    };
    let notifier = RecordingNotifier::default();
    let out = monitor(Some(NEWS), notifier.clone(), Box::new(store))
        .run()
        .await;

    assert_eq!(out.state, RunState::Done);
    assert_eq!(out.notifications_sent, 1);
    assert!(!out.history_persisted);
}

#[tokio::test]
async fn unreadable_history_is_never_overwritten() {
    let store = MemoryStore {
        fail_load: true,
        ..MemoryStore::default()
    };
    let out = monitor(Some(NEWS), RecordingNotifier::default(), Box::new(store.clone()))
        .run()
        .await;

    assert_eq!(out.state, RunState::Done);
    assert!(!out.history_persisted);
    assert!(store.persisted.lock().unwrap().is_none());
}
