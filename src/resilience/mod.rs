//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Idempotent ledger call:
//!     → retries.rs (check if retryable, retry with backoff)
//!     → backoff.rs (capped exponential delay, jittered)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every ledger call has a deadline
//! - Retries only for idempotent calls, never for submissions

pub mod backoff;
pub mod retries;

pub use retries::retry_with_backoff;
