//! The ledger boundary used by the orchestrator.

use std::time::Duration;

use alloy::primitives::{Bytes, TxHash};
use async_trait::async_trait;

use crate::ledger::types::{CallRequest, LedgerReceipt, LedgerResult, PreparedTransaction, PrivacyGroup};

/// Capability to sign-and-send, wait for, and query ledger transactions.
///
/// Implementations hold no per-request state and are shared behind an `Arc`
/// by every request.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Hand a transaction to the node. Never retried by the implementation.
    async fn submit(
        &self,
        tx: PreparedTransaction,
        privacy: Option<&PrivacyGroup>,
    ) -> LedgerResult<TxHash>;

    /// Block until the transaction is included or `timeout` elapses.
    ///
    /// A reverted transaction is a receipt with `success == false`, not an error.
    async fn await_receipt(&self, tx_hash: TxHash, timeout: Duration) -> LedgerResult<LedgerReceipt>;

    /// Execute a read-only call against the latest state.
    async fn call(&self, request: CallRequest) -> LedgerResult<Bytes>;

    /// Check if the node is reachable.
    async fn is_healthy(&self) -> bool;
}
