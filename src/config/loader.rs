//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use alloy::primitives::Bytes;

use crate::config::schema::WalletConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    Bytecode(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Bytecode(msg) => write!(f, "Contract bytecode error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WalletConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: WalletConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load hex-encoded contract creation bytecode (with or without `0x`).
pub fn load_bytecode(path: &Path) -> Result<Bytes, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let hex_str = content.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);

    let bytes = alloy::hex::decode(hex_str)
        .map_err(|e| ConfigError::Bytecode(format!("{}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(ConfigError::Bytecode(format!("{} is empty", path.display())));
    }
    Ok(Bytes::from(bytes))
}
