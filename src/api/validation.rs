//! Request body and header validation.
//!
//! Bodies deserialize into all-optional DTOs so that every missing or
//! malformed field is reported at once, not just the first.

use alloy::primitives::{Address, U256};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;

use crate::ledger::PrivacyGroup;
use crate::token::{ApproveRequest, ContractSpecification};

/// Header carrying the privacy group (repeatable or comma-separated).
pub const PRIVATE_FOR_HEADER: &str = "privatefor";
/// Optional per-request confirmation timeout, in seconds.
pub const CONFIRMATION_TIMEOUT_HEADER: &str = "x-confirmation-timeout";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployBody {
    pub initial_amount: Option<Value>,
    pub token_name: Option<String>,
    pub decimal_units: Option<Value>,
    pub token_symbol: Option<String>,
}

impl DeployBody {
    pub fn validate(self) -> Result<ContractSpecification, Vec<String>> {
        let mut errors = Vec::new();

        let initial_amount = required(&mut errors, "initialAmount", self.initial_amount.as_ref(), parse_uint);
        let decimal_units = required(&mut errors, "decimalUnits", self.decimal_units.as_ref(), parse_uint)
            .and_then(|d| match u8::try_from(d) {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push("decimalUnits: must be at most 255".to_string());
                    None
                }
            });
        let token_name = non_empty(&mut errors, "tokenName", self.token_name);
        let token_symbol = non_empty(&mut errors, "tokenSymbol", self.token_symbol);

        match (initial_amount, token_name, decimal_units, token_symbol) {
            (Some(initial_amount), Some(token_name), Some(decimal_units), Some(token_symbol))
                if errors.is_empty() =>
            {
                Ok(ContractSpecification {
                    initial_amount,
                    token_name,
                    decimal_units,
                    token_symbol,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBody {
    pub spender: Option<String>,
    pub value: Option<Value>,
}

impl ApproveBody {
    pub fn validate(self) -> Result<ApproveRequest, Vec<String>> {
        let mut errors = Vec::new();
        let spender = required(&mut errors, "spender", self.spender.as_deref(), parse_address);
        let value = required(&mut errors, "value", self.value.as_ref(), parse_uint);

        match (spender, value) {
            (Some(spender), Some(value)) => Ok(ApproveRequest { spender, value }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceQuery {
    pub owner_address: Option<String>,
    pub spender_address: Option<String>,
}

impl AllowanceQuery {
    pub fn validate(self) -> Result<(Address, Address), Vec<String>> {
        let mut errors = Vec::new();
        let owner = required(&mut errors, "ownerAddress", self.owner_address.as_deref(), parse_address);
        let spender = required(&mut errors, "spenderAddress", self.spender_address.as_deref(), parse_address);

        match (owner, spender) {
            (Some(owner), Some(spender)) => Ok((owner, spender)),
            _ => Err(errors),
        }
    }
}

/// Parse a path or query address, reporting failures against `field`.
pub fn address_param(field: &str, raw: &str) -> Result<Address, Vec<String>> {
    parse_address(raw).map_err(|reason| vec![format!("{}: {}", field, reason)])
}

/// 20-byte hex address, `0x` prefix optional.
pub fn parse_address(raw: &str) -> Result<Address, String> {
    let hex = raw.trim();
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("must be a 20-byte hex address".to_string());
    }
    hex.parse::<Address>()
        .map_err(|_| "must be a 20-byte hex address".to_string())
}

/// Non-negative integer from a JSON number, decimal string or `0x` string.
pub fn parse_uint(value: &Value) -> Result<U256, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| "must be a non-negative integer; use a string above 2^64".to_string()),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x") {
                Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16),
                Some(_) => return Err("must be a non-negative integer".to_string()),
                None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                    U256::from_str_radix(s, 10)
                }
                None => return Err("must be a non-negative integer".to_string()),
            };
            parsed.map_err(|_| "exceeds uint256".to_string())
        }
        _ => Err("must be a non-negative integer".to_string()),
    }
}

/// Collect the privacy group from every `privateFor` header value.
pub fn privacy_from_headers(headers: &HeaderMap) -> Option<PrivacyGroup> {
    let members: Vec<String> = headers
        .get_all(PRIVATE_FOR_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::to_string)
        .collect();
    PrivacyGroup::new(members)
}

/// Per-request confirmation timeout, in seconds, if the caller set one.
pub fn confirmation_timeout_from_headers(headers: &HeaderMap) -> Result<Option<u64>, Vec<String>> {
    let Some(raw) = headers.get(CONFIRMATION_TIMEOUT_HEADER) else {
        return Ok(None);
    };
    match raw.to_str().ok().and_then(|s| s.trim().parse::<u64>().ok()) {
        Some(secs) if secs > 0 => Ok(Some(secs)),
        _ => Err(vec![format!(
            "{}: must be a positive number of seconds",
            CONFIRMATION_TIMEOUT_HEADER
        )]),
    }
}

fn required<T: ?Sized, U>(
    errors: &mut Vec<String>,
    field: &str,
    value: Option<&T>,
    parse: impl Fn(&T) -> Result<U, String>,
) -> Option<U> {
    match value {
        None => {
            errors.push(format!("{}: is required", field));
            None
        }
        Some(v) => match parse(v) {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                errors.push(format!("{}: {}", field, reason));
                None
            }
        },
    }
}

fn non_empty(errors: &mut Vec<String>, field: &str, value: Option<String>) -> Option<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Some(s),
        Some(_) => {
            errors.push(format!("{}: must not be empty", field));
            None
        }
        None => {
            errors.push(format!("{}: is required", field));
            None
        }
    }
}
