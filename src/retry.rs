// src/retry.rs
//! Bounded retry for network operations (fetch and channel sends).

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Upper bound on attempts for one network operation.
pub const MAX_ATTEMPTS: u8 = 5;
/// Longest wait between two attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(4);

/// 500ms, 1s, 2s, 4s, then flat at `MAX_BACKOFF`.
pub fn backoff_delay(attempt: u8) -> Duration {
    let shift = u32::from(attempt.saturating_sub(1)).min(3);
    Duration::from_millis(500u64 << shift).min(MAX_BACKOFF)
}

/// Retry `op` with exponential backoff. `max_attempts` is clamped to `1..=MAX_ATTEMPTS`.
pub async fn with_backoff<T, F, Fut>(max_attempts: u8, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.clamp(1, MAX_ATTEMPTS);
    let mut attempt: u8 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts => {
                tracing::debug!(attempt, error = %format!("{e:#}"), "attempt failed, retrying");
                tokio::time::sleep(backoff_delay(attempt)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
