//! Ledger-facing types and error definitions.

use alloy::primitives::{Address, Bytes, Log, TxHash, U64};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::config::schema::NodeConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Errors that can occur while talking to the ledger node.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transport failure or no provider answered.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node refused the transaction (malformed, out of gas, unknown account...).
    #[error("Submission rejected: {0}")]
    Submission(String),

    /// The node answered a read-only call with an error (e.g. execution reverted).
    #[error("Call failed: {0}")]
    CallFailed(String),

    /// No receipt within the deadline. The transaction may still be included later.
    #[error("Transaction {tx_hash} not confirmed within {waited_secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl LedgerError {
    /// Whether repeating an idempotent request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Rpc(_))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Counterparties allowed to see a private transaction's payload.
///
/// Members are opaque to this service (Quorum transaction-manager public
/// keys) and are forwarded to the node verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivacyGroup(Vec<String>);

impl PrivacyGroup {
    /// Build a group from raw member tokens; blank tokens are dropped.
    ///
    /// Returns `None` when no members remain, meaning a public transaction.
    pub fn new<I, S>(members: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let members: Vec<String> = members
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if members.is_empty() {
            None
        } else {
            Some(Self(members))
        }
    }

    pub fn members(&self) -> &[String] {
        &self.0
    }
}

/// A transaction ready to hand to the node for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction {
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub input: Bytes,
    pub gas: Option<u64>,
}

/// A read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub input: Bytes,
}

/// What the ledger reported once a transaction was included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// `false` when contract logic reverted the transaction.
    pub success: bool,
    /// Set for contract-creation transactions.
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
}

/// `eth_sendTransaction` parameters with the Quorum `privateFor` extension.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendTransactionParams {
    from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<Address>,
    data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas: Option<U64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_for: Option<Vec<String>>,
}

impl SendTransactionParams {
    pub(crate) fn new(tx: PreparedTransaction, privacy: Option<&PrivacyGroup>) -> Self {
        Self {
            from: tx.from,
            to: tx.to,
            data: tx.input,
            gas: tx.gas.map(U64::from),
            private_for: privacy.map(|group| group.members().to_vec()),
        }
    }
}
