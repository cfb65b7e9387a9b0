//! Transaction orchestration and confirmation tracking.
//!
//! # Data Flow
//! ```text
//! TokenOperation
//!     → encoder (calldata + decoder)            BUILDING
//!     → ledger.submit (privateFor forwarded)    SUBMITTED, persisted
//!     → ledger.await_receipt (retried, bounded)
//!     → CONFIRMED | REVERTED | TIMED_OUT        persisted
//! ```
//! Reads skip the state machine and go straight to `ledger.call`.
//!
//! # Constraints
//! - Submissions are never retried
//! - A record exists only once the ledger returned a transaction id
//! - A timeout never cancels the transaction on the ledger

pub mod error;
pub mod service;
pub mod state;

pub use error::{WalletError, WalletResult};
pub use service::{OrchestratorSettings, TransactionOrchestrator, TxOutcome};
pub use state::{InvalidTransition, RequestLifecycle, TxState};
