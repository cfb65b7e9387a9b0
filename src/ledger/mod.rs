//! Ledger client adapter.
//!
//! # Data Flow
//! ```text
//! PreparedTransaction (+ optional PrivacyGroup)
//!     → client.rs (LedgerClient trait: submit / await_receipt / call)
//!     → rpc.rs (JSON-RPC over alloy providers, failover, polling)
//!     → LedgerReceipt (status, contract address, raw logs)
//! ```
//!
//! # Constraints
//! - No business policy here: no retries of submissions, no persistence
//! - The node signs with its own unlocked account; no keys pass through
//! - Every RPC call has a timeout

pub mod client;
#[cfg(test)]
pub(crate) mod mock;
pub mod rpc;
pub mod types;

pub use client::LedgerClient;
pub use rpc::RpcLedgerClient;
pub use types::{
    CallRequest, ChainId, LedgerError, LedgerReceipt, LedgerResult, PreparedTransaction,
    PrivacyGroup,
};
