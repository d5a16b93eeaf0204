//! Exponential backoff retry for backend calls.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::debug;

use crate::error::GeneratorError;

/// 3 total attempts, base 1s, max 10s between attempts.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 10;

/// Retry `attempt` while it fails transiently (see
/// [`GeneratorError::is_transient`]). Non-transient errors return
/// immediately; exhausting the attempts wraps the last error in
/// [`GeneratorError::RetriesExhausted`].
pub async fn with_backoff<T, Fut, F>(mut attempt: F) -> Result<T, GeneratorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeneratorError>>,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        let error = match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_transient() {
            return Err(error);
        }
        if attempts >= MAX_ATTEMPTS {
            return Err(GeneratorError::RetriesExhausted(Box::new(error)));
        }

        debug!(attempt = attempts, %error, "backend call failed, retrying");
        if let Some(wait) = backoff.next_backoff() {
            tokio::time::sleep(wait).await;
        }
    }
}
