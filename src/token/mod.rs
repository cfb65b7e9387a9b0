//! HumanStandardToken operations.
//!
//! `abi.rs` declares the contract interface, `encoder.rs` turns typed
//! operations into calldata and decodes what comes back, `types.rs` holds
//! the request and result shapes shared with the HTTP layer.

pub mod abi;
pub mod encoder;
pub mod types;

pub use encoder::{ContractEncoder, EncodeError, EncodedOperation, ReturnDecoder, TokenOperation};
pub use types::{
    ApproveRequest, ContractSpecification, DeployReceipt, ReadField, TokenEvent, TokenValue,
    TransferResult,
};
