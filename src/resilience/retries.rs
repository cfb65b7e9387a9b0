//! Retry logic.
//!
//! # Design Decisions
//! - Only idempotent ledger interactions go through here (read-only calls,
//!   receipt lookups); a transaction submission is never retried
//! - Callers decide which errors are transient
//! - Jittered backoff prevents thundering herd against the node

use std::future::Future;

use tokio::time::sleep;

use crate::config::RetryConfig;
use crate::resilience::backoff::delay_for;

/// Run `op` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryConfig,
    operation: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_retryable(&e) => {
                let delay = delay_for(policy, attempt);
                tracing::info!(
                    operation = %operation,
                    attempt = attempt,
                    delay = ?delay,
                    error = %e,
                    "Retrying ledger call"
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
