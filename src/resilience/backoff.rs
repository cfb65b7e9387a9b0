//! Jittered exponential delays between ledger retries.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delay before retry number `retry` (1-based).
///
/// Doubles from `base_delay_ms`, capped at `max_delay_ms`, then shortened by
/// up to a quarter so concurrent pollers drift apart.
pub fn delay_for(policy: &RetryConfig, retry: u32) -> Duration {
    if retry == 0 || policy.base_delay_ms == 0 {
        return Duration::ZERO;
    }

    let ceiling = policy
        .base_delay_ms
        .saturating_mul(1u64 << (retry - 1).min(32))
        .min(policy.max_delay_ms);
    let spread = ceiling / 4;
    let shave = if spread > 0 {
        rand::thread_rng().gen_range(0..=spread)
    } else {
        0
    };
    Duration::from_millis(ceiling - shave)
}
