//! Sends one sample notification through every configured channel, to check credentials.

use chrono::Utc;
use keyword_sentinel::config::load_config_default;
use keyword_sentinel::{init_tracing, NotificationEvent, Notifier, NotifierMux};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cfg = load_config_default()?;
    let mux = NotifierMux::from_env(&cfg.notify);
    if !mux.is_configured() {
        anyhow::bail!("no notification channel configured; set TELEGRAM_TOKEN/TELEGRAM_CHAT_ID or a webhook");
    }

    let ev = NotificationEvent {
        headline: cfg.notify.headline.clone(),
        title: "Test notification from keyword-sentinel".into(),
        link: cfg.source.locations.first().cloned().unwrap_or_default(),
        matched_group: Some("demo".into()),
        matched_keyword: Some("test".into()),
        published_at: None,
        detected_at: Utc::now(),
        footer: cfg.notify.footer.clone(),
    };

    match mux.send(&ev).await {
        Ok(()) => println!("notify-demo delivered"),
        Err(e) => println!("notify-demo failed: {e:#}"),
    }
    Ok(())
}
