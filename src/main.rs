//! keyword-sentinel: one monitoring run per invocation.
//! Scheduling is external (cron / CI schedule); overlapping runs must be prevented there.

use anyhow::Result;
use keyword_sentinel::config::load_config_default;
use keyword_sentinel::metrics::TextfileMetrics;
use keyword_sentinel::{init_tracing, Monitor};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Config errors (bad selector/regex, unreadable file) are the only fatal ones.
    let cfg = load_config_default()?;

    let textfile = match &cfg.metrics.textfile {
        Some(path) => match TextfileMetrics::install(path) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!("metrics disabled: {e:#}");
                None
            }
        },
        None => None,
    };

    let monitor = Monitor::from_config(&cfg)?;
    let outcome = monitor.run().await;

    if let Some(m) = textfile {
        if let Err(e) = m.write() {
            tracing::warn!("{e:#}");
        }
    }

    if outcome.is_aborted() {
        tracing::info!("run ended without content");
    }
    Ok(())
}
