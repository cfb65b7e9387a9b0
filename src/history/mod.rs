//! Ledger transaction history.
//!
//! # Data Flow
//! ```text
//! orchestrator: insert(SUBMITTED) once a tx id exists
//!     → resolve(CONFIRMED | FAILED | TIMED_OUT) after the receipt wait
//!     → records and address index updated in one sled transaction, then flushed
//! HTTP: find_by_address / find_unresolved (read-only)
//! ```
//!
//! # Constraints
//! - `CONFIRMED` and `FAILED` records never change
//! - Lookups by address cover both sender and receiver
//! - The final-state check and the write happen atomically

pub mod store;
pub mod types;

pub use store::{HistoryStore, SledStore};
pub use types::{StatusUpdate, StoreError, StoreResult, Transaction, TransactionStatus};
