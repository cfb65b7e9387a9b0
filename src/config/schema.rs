//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wallet
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the wallet service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// HTTP timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Ledger node connection settings.
    pub node: NodeConfig,

    /// Token contract artifact settings.
    pub token: TokenConfig,

    /// Transaction history persistence.
    pub history: HistoryConfig,

    /// Retry policy for read-only ledger calls and receipt polling.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl WalletConfig {
    /// Worst-case seconds a state-changing request spends outside its
    /// confirmation wait: submission across every provider, receipt retry
    /// backoff and one second to record the outcome.
    pub fn transaction_overhead_secs(&self) -> u64 {
        let providers = 1 + self.node.failover_urls.len() as u64;
        let retries = u64::from(self.retries.max_attempts.saturating_sub(1));
        let backoff_ms = self.retries.max_delay_ms.saturating_mul(retries);
        self.node
            .rpc_timeout_secs
            .saturating_mul(providers)
            .saturating_add(backoff_ms.div_ceil(1000))
            .saturating_add(1)
    }

    /// Longest confirmation wait that still answers within `timeouts.request_secs`.
    pub fn max_confirmation_secs(&self) -> u64 {
        self.timeouts
            .request_secs
            .saturating_sub(self.transaction_overhead_secs())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 64 * 1024,
        }
    }
}

/// Timeout configuration for the HTTP surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    /// Must cover `node.confirmation_timeout_secs` plus the transaction overhead.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

/// Ledger node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID the node is expected to report.
    pub chain_id: u64,

    /// Unlocked node account that sends every transaction.
    pub from_address: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Block depth required on top of the inclusion block (0 for instant finality).
    pub confirmation_blocks: u32,

    /// Default time to wait for a receipt, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Gas limit attached to state-changing transactions.
    pub gas_limit: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:22000".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1337,
            from_address: "0xed9d02e382b34818e88b88a309c7fe71e65f419d".to_string(),
            rpc_timeout_secs: 10,
            confirmation_blocks: 0,
            confirmation_timeout_secs: 60,
            poll_interval_ms: 500,
            gas_limit: 4_700_000,
        }
    }
}

/// Token contract artifact configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TokenConfig {
    /// Path to the hex-encoded HumanStandardToken creation bytecode.
    /// Deployment is unavailable when unset.
    pub bytecode_path: Option<String>,
}

/// Transaction history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// sled database directory. `None` uses a temporary database removed on exit.
    pub db_path: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: Some("data/history".to_string()),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts for a retryable ledger call.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
