//! Persisted transaction records.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::types::decimal;

/// Lifecycle status of a persisted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Submitted,
    Confirmed,
    /// Included but reverted by contract logic.
    Failed,
    /// No receipt within the deadline; outcome unknown.
    TimedOut,
}

impl TransactionStatus {
    /// Final records are immutable.
    pub fn is_final(self) -> bool {
        matches!(self, TransactionStatus::Confirmed | TransactionStatus::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Submitted => "SUBMITTED",
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// One submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TxHash,
    pub from_address: Address,
    /// Absent while a deploy is in flight.
    pub to_address: Option<Address>,
    #[serde(with = "decimal")]
    pub value: U256,
    pub operation: String,
    pub status: TransactionStatus,
    pub block_number: Option<u64>,
    pub created_at: u64,
}

impl Transaction {
    /// A freshly submitted record, timestamped now.
    pub fn submitted(
        id: TxHash,
        from_address: Address,
        to_address: Option<Address>,
        value: U256,
        operation: String,
    ) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            id,
            from_address,
            to_address,
            value,
            operation,
            status: TransactionStatus::Submitted,
            block_number: None,
            created_at,
        }
    }
}

/// Resolution applied to a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: TransactionStatus,
    pub block_number: Option<u64>,
    /// Fills in a deploy's contract address.
    pub to_address: Option<Address>,
}

/// History store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transaction {0} already recorded")]
    Duplicate(TxHash),

    #[error("Transaction {0} not found")]
    NotFound(TxHash),

    #[error("Transaction {id} is {status} and cannot change")]
    Immutable { id: TxHash, status: TransactionStatus },

    #[error("History database error: {0}")]
    Db(#[from] sled::Error),

    #[error("History record serialization failed: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::TimedOut).unwrap(),
            "\"TIMED_OUT\""
        );
        assert_eq!(TransactionStatus::Failed.to_string(), "FAILED");
        assert!(TransactionStatus::Confirmed.is_final());
        assert!(!TransactionStatus::TimedOut.is_final());
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx = Transaction::submitted(
            TxHash::repeat_byte(0x0a),
            Address::repeat_byte(0x01),
            None,
            U256::from(1_000_000u64),
            "deploy(...)".to_string(),
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["status"], "SUBMITTED");
        assert_eq!(json["value"], "1000000");
        assert!(json["toAddress"].is_null());
        assert!(json["createdAt"].as_u64().unwrap() > 0);

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

}
