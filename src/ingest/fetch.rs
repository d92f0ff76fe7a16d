// src/ingest/fetch.rs
//! Fetcher boundary: raw document text for a location, plus the
//! "first successful candidate location wins" chain used by the monitor.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::retry::{with_backoff, MAX_ATTEMPTS};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Raw document text, or an error for any transport / non-2xx failure.
    async fn fetch(&self, location: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    max_attempts: u8,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            timeout: Duration::from_secs(15),
            max_attempts: 1,
        })
    }

    pub fn from_config(cfg: &SourceConfig) -> Result<Self> {
        Ok(Self::new(&cfg.user_agent)?
            .with_timeout(cfg.timeout_secs)
            .with_retries(cfg.retries))
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    /// Total attempts per location (1 = no retry), at most `MAX_ATTEMPTS`.
    pub fn with_retries(mut self, attempts: u8) -> Self {
        self.max_attempts = attempts.clamp(1, MAX_ATTEMPTS);
        self
    }

    async fn fetch_once(&self, location: &str) -> Result<String> {
        let resp = self
            .client
            .get(location)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("GET {location}"))?
            .error_for_status()
            .with_context(|| format!("GET {location} non-2xx"))?;
        resp.text()
            .await
            .with_context(|| format!("read body of {location}"))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        with_backoff(self.max_attempts, || self.fetch_once(location)).await
    }
}

/// A document that was fetched successfully, with the location it came from.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub location: String,
    pub body: String,
}

/// Try each location in priority order; the first non-empty body wins.
/// Transport errors and non-2xx responses are treated the same way.
pub async fn fetch_first(fetcher: &dyn Fetcher, locations: &[String]) -> Result<FetchedDocument> {
    for location in locations {
        match fetcher.fetch(location).await {
            Ok(body) if !body.trim().is_empty() => {
                tracing::info!(location = %location, bytes = body.len(), "document fetched");
                return Ok(FetchedDocument {
                    location: location.clone(),
                    body,
                });
            }
            Ok(_) => {
                tracing::warn!(location = %location, "empty document");
                counter!("sentinel_fetch_failures_total").increment(1);
            }
            Err(e) => {
                tracing::warn!(location = %location, error = %format!("{e:#}"), "fetch failed");
                counter!("sentinel_fetch_failures_total").increment(1);
            }
        }
    }
    Err(anyhow!(
        "no usable document from {} candidate location(s)",
        locations.len()
    ))
}
