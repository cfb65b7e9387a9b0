//! Service-level error taxonomy.

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::history::StoreError;
use crate::ledger::LedgerError;
use crate::orchestrator::state::InvalidTransition;
use crate::token::EncodeError;

/// Errors surfaced to callers of the wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("{}", .0.join(","))]
    Validation(Vec<String>),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The node refused the transaction; nothing was recorded.
    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// A read-only call errored or returned undecodable output.
    #[error("Contract call failed: {0}")]
    CallFailed(String),

    #[error("Transaction {tx_id} reverted")]
    Reverted {
        tx_id: TxHash,
        block_number: Option<u64>,
    },

    /// Outcome unknown; the transaction may still be included.
    #[error("Transaction {tx_id} not confirmed within {waited_secs} seconds")]
    ConfirmationTimeout { tx_id: TxHash, waited_secs: u64 },

    #[error("History store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// A spawned task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for WalletError {
    fn from(err: tokio::task::JoinError) -> Self {
        WalletError::Internal(err.to_string())
    }
}

impl From<LedgerError> for WalletError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rpc(msg) => WalletError::LedgerUnavailable(msg),
            LedgerError::Submission(msg) => WalletError::Submission(msg),
            LedgerError::CallFailed(msg) => WalletError::CallFailed(msg),
            LedgerError::ConfirmationTimeout {
                tx_hash,
                waited_secs,
            } => WalletError::ConfirmationTimeout {
                tx_id: tx_hash,
                waited_secs,
            },
            e @ LedgerError::ChainMismatch { .. } => WalletError::LedgerUnavailable(e.to_string()),
        }
    }
}

impl From<EncodeError> for WalletError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnsupportedOperation(msg) => WalletError::Unsupported(msg),
            e @ EncodeError::Decode { .. } => WalletError::CallFailed(e.to_string()),
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
