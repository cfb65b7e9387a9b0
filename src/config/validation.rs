//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses well-formed)
//! - Check cross-field constraints (HTTP timeout covers confirmation wait plus overhead)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WalletConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::WalletConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &WalletConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::new("listener.max_body_size", "must be greater than 0"));
    }

    let node = &config.node;
    if let Err(e) = node.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new("node.rpc_url", format!("invalid URL: {}", e)));
    }
    for (i, failover) in node.failover_urls.iter().enumerate() {
        if let Err(e) = failover.parse::<url::Url>() {
            errors.push(ValidationError::new(
                &format!("node.failover_urls[{}]", i),
                format!("invalid URL: {}", e),
            ));
        }
    }
    if node.from_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "node.from_address",
            "must be a 20-byte hex address",
        ));
    }
    if node.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("node.rpc_timeout_secs", "must be greater than 0"));
    }
    if node.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "node.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if node.poll_interval_ms == 0 {
        errors.push(ValidationError::new("node.poll_interval_ms", "must be greater than 0"));
    }
    if node.gas_limit == 0 {
        errors.push(ValidationError::new("node.gas_limit", "must be greater than 0"));
    }

    if node.confirmation_timeout_secs > config.max_confirmation_secs() {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must be at least node.confirmation_timeout_secs ({}) plus {}s of submission and retry overhead",
                node.confirmation_timeout_secs,
                config.transaction_overhead_secs()
            ),
        ));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", observability.log_format),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
