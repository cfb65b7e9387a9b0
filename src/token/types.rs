//! Token operation inputs and decoded results.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, TxHash, U256};
use serde::{Serialize, Serializer};

use crate::token::encoder::EncodeError;

/// Constructor arguments for a token deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSpecification {
    #[serde(with = "decimal")]
    pub initial_amount: U256,
    pub token_name: String,
    pub decimal_units: u8,
    pub token_symbol: String,
}

/// Grant `spender` an allowance of `value` from the sending account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub spender: Address,
    #[serde(with = "decimal")]
    pub value: U256,
}

/// Zero-argument metadata getters on the token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadField {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    Version,
}

impl ReadField {
    pub const ALL: [ReadField; 5] = [
        ReadField::Name,
        ReadField::Symbol,
        ReadField::Decimals,
        ReadField::TotalSupply,
        ReadField::Version,
    ];

    /// Contract method name.
    pub fn as_str(self) -> &'static str {
        match self {
            ReadField::Name => "name",
            ReadField::Symbol => "symbol",
            ReadField::Decimals => "decimals",
            ReadField::TotalSupply => "totalSupply",
            ReadField::Version => "version",
        }
    }
}

impl FromStr for ReadField {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| EncodeError::UnsupportedOperation(format!("read '{}'", s)))
    }
}

impl fmt::Display for ReadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded return value from a read-only call.
///
/// Integers serialize as decimal strings so uint256 values survive JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Text(String),
    Integer(U256),
}

impl TokenValue {
    pub fn as_integer(&self) -> Option<U256> {
        match self {
            TokenValue::Integer(v) => Some(*v),
            TokenValue::Text(_) => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Text(s) => f.write_str(s),
            TokenValue::Integer(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for TokenValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TokenValue::Text(s) => serializer.serialize_str(s),
            TokenValue::Integer(v) => serializer.collect_str(v),
        }
    }
}

/// Events emitted by the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TokenEvent {
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "decimal")]
        value: U256,
    },
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "decimal")]
        value: U256,
    },
}

/// Result of a confirmed state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub tx_id: TxHash,
    pub event: TokenEvent,
}

/// Result of a confirmed deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReceipt {
    pub contract_address: Address,
    pub tx_id: TxHash,
    pub event: Option<TokenEvent>,
}

/// Serde adapter rendering `U256` as a decimal string.
pub mod decimal {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}
