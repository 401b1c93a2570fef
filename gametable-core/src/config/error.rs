//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML or wrong value types
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment override could not be parsed
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Values parsed but are inconsistent
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
