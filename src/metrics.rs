// src/metrics.rs
//! Run counters. Without an installed recorder the macros are no-ops; with
//! `[metrics].textfile` set, a Prometheus recorder is installed and its
//! exposition is written out after the run.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

/// One-time metrics registration (so series carry descriptions).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sentinel_runs_total", "Monitor runs started.");
        describe_counter!(
            "sentinel_fetch_failures_total",
            "Candidate locations that failed or returned an empty document."
        );
        describe_counter!(
            "sentinel_candidates_total",
            "Raw items produced by the winning extraction strategy."
        );
        describe_counter!("sentinel_items_unique_total", "Items left after in-run dedup.");
        describe_counter!("sentinel_matches_total", "Items matching a keyword group.");
        describe_counter!(
            "sentinel_notifications_sent_total",
            "Notifications confirmed delivered."
        );
        describe_counter!(
            "sentinel_notification_failures_total",
            "Notifications that were not confirmed."
        );
        describe_gauge!("sentinel_history_size", "Identities in the history set after the run.");
        describe_gauge!("sentinel_last_run_ts", "Unix ts when the monitor last finished.");
        describe_histogram!("sentinel_extract_ms", "Extraction time in milliseconds.");
    });
}

/// Prometheus recorder whose rendering goes to a file (textfile collector).
pub struct TextfileMetrics {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl TextfileMetrics {
    pub fn install(path: &Path) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self {
            handle,
            path: path.to_path_buf(),
        })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn write(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        std::fs::write(&self.path, self.render())
            .with_context(|| format!("writing metrics to {}", self.path.display()))
    }
}
