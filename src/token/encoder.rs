//! Contract operation encoder.
//!
//! Maps a [`TokenOperation`] to ledger calldata plus a [`ReturnDecoder`]
//! that knows the shape of what the ledger will hand back (a return value
//! for reads, an event for writes). Dispatch on the operation kind happens
//! once, here.

use alloy::primitives::{Address, Bytes, Log, U256};
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use thiserror::Error;

use crate::token::abi::IHumanStandardToken;
use crate::token::types::{ApproveRequest, ContractSpecification, ReadField, TokenEvent, TokenValue};

/// Errors raised while encoding requests or decoding ledger output.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The operation is not something this encoder can build. Never retried.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Ledger output did not match the expected ABI shape.
    #[error("Failed to decode {method} output: {reason}")]
    Decode { method: &'static str, reason: String },
}

/// A token operation, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOperation {
    Deploy(ContractSpecification),
    Read(ReadField),
    Approve(ApproveRequest),
    Allowance { owner: Address, spender: Address },
}

impl TokenOperation {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenOperation::Deploy(_) => "deploy",
            TokenOperation::Read(field) => field.as_str(),
            TokenOperation::Approve(_) => "approve",
            TokenOperation::Allowance { .. } => "allowance",
        }
    }

    /// Whether the operation is answered by a call rather than a transaction.
    pub fn is_read_only(&self) -> bool {
        matches!(self, TokenOperation::Read(_) | TokenOperation::Allowance { .. })
    }

    /// Audit-trail description persisted with the transaction.
    pub fn summary(&self) -> String {
        match self {
            TokenOperation::Deploy(spec) => format!(
                "deploy(initialAmount={}, name={:?}, decimals={}, symbol={:?})",
                spec.initial_amount, spec.token_name, spec.decimal_units, spec.token_symbol
            ),
            TokenOperation::Read(field) => format!("{}()", field),
            TokenOperation::Approve(req) => {
                format!("approve(spender={}, value={})", req.spender, req.value)
            }
            TokenOperation::Allowance { owner, spender } => {
                format!("allowance(owner={}, spender={})", owner, spender)
            }
        }
    }
}

/// Decoder for whatever the encoded operation produces on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDecoder {
    Field(ReadField),
    Allowance,
    /// `Approval(owner, spender, value)` from the token being approved on.
    ApprovalEvent { spender: Address, value: U256 },
    DeployedContract,
}

impl ReturnDecoder {
    /// Decode the return data of a read-only call.
    pub fn decode_return(&self, data: &[u8]) -> Result<TokenValue, EncodeError> {
        let decoded = match self {
            ReturnDecoder::Field(ReadField::Name) => {
                IHumanStandardToken::nameCall::abi_decode_returns(data).map(TokenValue::Text)
            }
            ReturnDecoder::Field(ReadField::Symbol) => {
                IHumanStandardToken::symbolCall::abi_decode_returns(data).map(TokenValue::Text)
            }
            ReturnDecoder::Field(ReadField::Version) => {
                IHumanStandardToken::versionCall::abi_decode_returns(data).map(TokenValue::Text)
            }
            ReturnDecoder::Field(ReadField::Decimals) => {
                IHumanStandardToken::decimalsCall::abi_decode_returns(data)
                    .map(|d| TokenValue::Integer(U256::from(d)))
            }
            ReturnDecoder::Field(ReadField::TotalSupply) => {
                IHumanStandardToken::totalSupplyCall::abi_decode_returns(data)
                    .map(TokenValue::Integer)
            }
            ReturnDecoder::Allowance => {
                IHumanStandardToken::allowanceCall::abi_decode_returns(data)
                    .map(TokenValue::Integer)
            }
            ReturnDecoder::ApprovalEvent { .. } | ReturnDecoder::DeployedContract => {
                return Err(EncodeError::UnsupportedOperation(
                    "state-changing operations have no return value".to_string(),
                ));
            }
        };
        decoded.map_err(|e| EncodeError::Decode {
            method: self.method(),
            reason: e.to_string(),
        })
    }

    /// Whether a confirmed transaction must carry the event to count as applied.
    pub fn expects_event(&self) -> bool {
        matches!(self, ReturnDecoder::ApprovalEvent { .. })
    }

    /// Find the event this operation emitted among receipt logs.
    ///
    /// Only logs from `emitter` are considered; an approval must also name
    /// `sender` as owner and match the requested spender and value.
    pub fn decode_event(&self, emitter: Address, sender: Address, logs: &[Log]) -> Option<TokenEvent> {
        let own_logs = logs.iter().filter(|log| log.address == emitter);
        match self {
            ReturnDecoder::ApprovalEvent { spender, value } => own_logs
                .filter_map(|log| IHumanStandardToken::Approval::decode_log_data(&log.data).ok())
                .find(|e| e.owner == sender && e.spender == *spender && e.value == *value)
                .map(|e| TokenEvent::Approval {
                    owner: e.owner,
                    spender: e.spender,
                    value: e.value,
                }),
            ReturnDecoder::DeployedContract => own_logs
                .filter_map(|log| IHumanStandardToken::Transfer::decode_log_data(&log.data).ok())
                .next()
                .map(|e| TokenEvent::Transfer {
                    from: e.from,
                    to: e.to,
                    value: e.value,
                }),
            ReturnDecoder::Field(_) | ReturnDecoder::Allowance => None,
        }
    }

    fn method(&self) -> &'static str {
        match self {
            ReturnDecoder::Field(field) => field.as_str(),
            ReturnDecoder::Allowance => "allowance",
            ReturnDecoder::ApprovalEvent { .. } => "approve",
            ReturnDecoder::DeployedContract => "deploy",
        }
    }
}

/// Calldata plus the matching decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedOperation {
    pub input: Bytes,
    pub decoder: ReturnDecoder,
}

/// Builds token calldata. Stateless apart from the contract creation code.
#[derive(Debug, Clone, Default)]
pub struct ContractEncoder {
    bytecode: Option<Bytes>,
}

impl ContractEncoder {
    /// `bytecode` is the token's creation code; without it deploys are unsupported.
    pub fn new(bytecode: Option<Bytes>) -> Self {
        Self { bytecode }
    }

    /// Encode an operation into calldata.
    pub fn encode(&self, operation: &TokenOperation) -> Result<EncodedOperation, EncodeError> {
        let (input, decoder) = match operation {
            TokenOperation::Deploy(spec) => {
                let bytecode = self.bytecode.as_ref().ok_or_else(|| {
                    EncodeError::UnsupportedOperation(
                        "deploy: no contract bytecode configured".to_string(),
                    )
                })?;
                // uint8 occupies a full word, same as uint256.
                let args = (
                    spec.initial_amount,
                    spec.token_name.clone(),
                    U256::from(spec.decimal_units),
                    spec.token_symbol.clone(),
                )
                    .abi_encode_params();
                let mut input = Vec::with_capacity(bytecode.len() + args.len());
                input.extend_from_slice(bytecode);
                input.extend_from_slice(&args);
                (input, ReturnDecoder::DeployedContract)
            }
            TokenOperation::Read(field) => {
                let input = match field {
                    ReadField::Name => IHumanStandardToken::nameCall {}.abi_encode(),
                    ReadField::Symbol => IHumanStandardToken::symbolCall {}.abi_encode(),
                    ReadField::Decimals => IHumanStandardToken::decimalsCall {}.abi_encode(),
                    ReadField::TotalSupply => IHumanStandardToken::totalSupplyCall {}.abi_encode(),
                    ReadField::Version => IHumanStandardToken::versionCall {}.abi_encode(),
                };
                (input, ReturnDecoder::Field(*field))
            }
            TokenOperation::Approve(req) => {
                let input = IHumanStandardToken::approveCall {
                    spender: req.spender,
                    value: req.value,
                }
                .abi_encode();
                (
                    input,
                    ReturnDecoder::ApprovalEvent {
                        spender: req.spender,
                        value: req.value,
                    },
                )
            }
            TokenOperation::Allowance { owner, spender } => {
                let input = IHumanStandardToken::allowanceCall {
                    owner: *owner,
                    spender: *spender,
                }
                .abi_encode();
                (input, ReturnDecoder::Allowance)
            }
        };

        Ok(EncodedOperation {
            input: Bytes::from(input),
            decoder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::LogData;

    fn spec() -> ContractSpecification {
        ContractSpecification {
            initial_amount: U256::from(1_000_000u64),
            token_name: "Quorum Token".to_string(),
            decimal_units: 6,
            token_symbol: "QT".to_string(),
        }
    }

    #[test]
    fn test_deploy_appends_constructor_args_to_bytecode() {
        let bytecode = Bytes::from(vec![0x60, 0x80, 0x60, 0x40]);
        let encoder = ContractEncoder::new(Some(bytecode.clone()));

        let encoded = encoder.encode(&TokenOperation::Deploy(spec())).unwrap();
        assert!(encoded.input.starts_with(&bytecode));
        assert_eq!(encoded.decoder, ReturnDecoder::DeployedContract);

        let args = <(U256, String, U256, String)>::abi_decode_params(&encoded.input[bytecode.len()..]).unwrap();
        assert_eq!(args.0, U256::from(1_000_000u64));
        assert_eq!(args.1, "Quorum Token");
        assert_eq!(args.2, U256::from(6u64));
        assert_eq!(args.3, "QT");
    }

    #[test]
    fn test_deploy_without_bytecode_is_unsupported() {
        let encoder = ContractEncoder::default();
        let err = encoder.encode(&TokenOperation::Deploy(spec())).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_approve_calldata() {
        let spender = Address::repeat_byte(0xca);
        let encoded = ContractEncoder::default()
            .encode(&TokenOperation::Approve(ApproveRequest {
                spender,
                value: U256::from(10_000u64),
            }))
            .unwrap();

        assert_eq!(&encoded.input[..4], IHumanStandardToken::approveCall::SELECTOR.as_slice());
        let call = IHumanStandardToken::approveCall::abi_decode(&encoded.input).unwrap();
        assert_eq!(call.spender, spender);
        assert_eq!(call.value, U256::from(10_000u64));
    }

    #[test]
    fn test_read_selectors_are_distinct() {
        let encoder = ContractEncoder::default();
        let selectors: std::collections::HashSet<Vec<u8>> = ReadField::ALL
            .into_iter()
            .map(|f| encoder.encode(&TokenOperation::Read(f)).unwrap().input.to_vec())
            .collect();
        assert_eq!(selectors.len(), ReadField::ALL.len());
    }

    #[test]
    fn test_decode_returns() {
        let decimals = ReturnDecoder::Field(ReadField::Decimals)
            .decode_return(&U256::from(6u64).abi_encode())
            .unwrap();
        assert_eq!(decimals, TokenValue::Integer(U256::from(6u64)));

        let symbol = ReturnDecoder::Field(ReadField::Symbol)
            .decode_return(&"QT".to_string().abi_encode())
            .unwrap();
        assert_eq!(symbol, TokenValue::Text("QT".to_string()));
    }

    #[test]
    fn test_decode_return_rejects_empty_output() {
        let err = ReturnDecoder::Field(ReadField::Name).decode_return(&[]).unwrap_err();
        assert!(matches!(err, EncodeError::Decode { method: "name", .. }));
    }

    fn approval(owner: u8, spender: u8, value: u64) -> LogData {
        IHumanStandardToken::Approval {
            owner: Address::repeat_byte(owner),
            spender: Address::repeat_byte(spender),
            value: U256::from(value),
        }
        .encode_log_data()
    }

    #[test]
    fn test_decode_approval_event_skips_foreign_logs() {
        let contract = Address::repeat_byte(0x42);
        let other_token = Address::repeat_byte(0x43);
        let expected = ReturnDecoder::ApprovalEvent {
            spender: Address::repeat_byte(0x02),
            value: U256::from(10_000u64),
        };
        let logs = vec![
            Log {
                address: contract,
                data: LogData::new_unchecked(vec![], Bytes::from(vec![1, 2, 3])),
            },
            // Same shape, emitted by a different token.
            Log {
                address: other_token,
                data: approval(0x01, 0x02, 10_000),
            },
            // Right token, different spender.
            Log {
                address: contract,
                data: approval(0x01, 0x03, 10_000),
            },
            Log {
                address: contract,
                data: approval(0x01, 0x02, 10_000),
            },
        ];

        let event = expected
            .decode_event(contract, Address::repeat_byte(0x01), &logs)
            .unwrap();
        assert_eq!(
            event,
            TokenEvent::Approval {
                owner: Address::repeat_byte(0x01),
                spender: Address::repeat_byte(0x02),
                value: U256::from(10_000u64),
            }
        );
        assert!(ReturnDecoder::Allowance
            .decode_event(contract, Address::repeat_byte(0x01), &logs)
            .is_none());
    }

    #[test]
    fn test_approval_from_other_contract_is_not_ours() {
        let contract = Address::repeat_byte(0x42);
        let decoder = ReturnDecoder::ApprovalEvent {
            spender: Address::repeat_byte(0x02),
            value: U256::from(5u64),
        };
        let logs = vec![Log {
            address: Address::repeat_byte(0x43),
            data: approval(0x01, 0x02, 5),
        }];

        assert!(decoder.expects_event());
        assert!(decoder.decode_event(contract, Address::repeat_byte(0x01), &logs).is_none());
        // Another owner on the right contract does not count either.
        let logs = vec![Log {
            address: contract,
            data: approval(0x09, 0x02, 5),
        }];
        assert!(decoder.decode_event(contract, Address::repeat_byte(0x01), &logs).is_none());
    }

    #[test]
    fn test_deploy_picks_up_mint_transfer() {
        let contract = Address::repeat_byte(0x42);
        let mint = IHumanStandardToken::Transfer {
            from: Address::ZERO,
            to: Address::repeat_byte(0x01),
            value: U256::from(1_000_000u64),
        };
        let logs = vec![Log {
            address: contract,
            data: mint.encode_log_data(),
        }];

        let event = ReturnDecoder::DeployedContract.decode_event(contract, Address::repeat_byte(0x01), &logs);
        assert_eq!(
            event,
            Some(TokenEvent::Transfer {
                from: Address::ZERO,
                to: Address::repeat_byte(0x01),
                value: U256::from(1_000_000u64),
            })
        );
        assert!(!ReturnDecoder::DeployedContract.expects_event());
        assert!(ReturnDecoder::DeployedContract
            .decode_event(Address::repeat_byte(0x43), Address::repeat_byte(0x01), &logs)
            .is_none());
    }

    #[test]
    fn test_summary_mentions_arguments() {
        let summary = TokenOperation::Deploy(spec()).summary();
        assert!(summary.contains("1000000"));
        assert!(summary.contains("\"QT\""));
        assert!(TokenOperation::Read(ReadField::Name).is_read_only());
        assert!(!TokenOperation::Deploy(spec()).is_read_only());
    }
}
