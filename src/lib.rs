// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod extract;
pub mod history;
pub mod ingest;
pub mod keywords;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod retry;

// ---- Re-exports for stable public API ----
pub use crate::ingest::types::{CandidateItem, IdentityBasis, ItemIdentity};
pub use crate::monitor::{Monitor, RunOutcome, RunState};
pub use crate::notify::{NotificationEvent, Notifier, NotifierMux};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON when `LOG_FORMAT=json`. Filter via `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("keyword_sentinel=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialized: {e}");
    }
}
