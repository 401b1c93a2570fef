//! Logging setup
//!
//! Installs a `tracing` subscriber with an `EnvFilter` and either a plain or
//! a JSON formatter writing to stderr. `RUST_LOG`, when set, overrides the
//! configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

mod error;
mod level;

pub use error::LoggingError;
pub use level::LogLevel;

/// Logging configuration, also the `[logging]` section of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level when `RUST_LOG` is not set
    pub level: LogLevel,
    pub with_timestamp: bool,
    /// Include the emitting module path
    pub with_target: bool,
    /// One JSON object per line instead of human-readable text
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamp: true,
            with_target: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(self.with_target);
        match (self.json_format, self.with_timestamp) {
            (true, true) => layer.json().boxed(),
            (true, false) => layer.json().without_time().boxed(),
            (false, true) => layer.boxed(),
            (false, false) => layer.without_time().boxed(),
        }
    }
}

/// Initialize logging at `info` with the plain formatter
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Install the global subscriber described by `config`
///
/// # Example
/// ```
/// use gametable_core::logging::{init_logging_with_config, LogConfig, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug).json_format(true);
/// init_logging_with_config(config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter())
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new(LogLevel::Debug)
            .with_timestamp(false)
            .with_target(false)
            .json_format(true);

        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.with_timestamp);
        assert!(!config.with_target);
        assert!(config.json_format);
    }

    #[test]
    fn test_log_config_from_toml() {
        let config: LogConfig = toml::from_str("level = \"warn\"\njson_format = true").unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert!(config.json_format);
        assert!(config.with_target);
    }

    #[test]
    fn test_second_init_fails() {
        // Whichever call comes second in this process must be refused
        let first = init_logging_with_config(LogConfig::new(LogLevel::Error));
        let second = init_logging_with_config(LogConfig::new(LogLevel::Error));
        assert!(first.is_ok() || second.is_err());
        assert!(matches!(second, Err(LoggingError::InitializationFailed(_))));
    }
}
