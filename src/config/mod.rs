//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WalletConfig (validated, immutable)
//!     → cloned into the subsystems that need a section
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_bytecode, load_config, ConfigError};
pub use validation::{validate_config, ValidationError};
pub use schema::{
    HistoryConfig, ListenerConfig, NodeConfig, ObservabilityConfig, RetryConfig, TimeoutConfig,
    TokenConfig, WalletConfig,
};
