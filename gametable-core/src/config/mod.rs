//! Configuration management for Gametable
//!
//! Defaults can be overridden from a TOML file or from environment
//! variables; both paths end in [`Config::validate`].

use crate::core_session::code::{InviteCodeGenerator, MAX_CODE_LEN};
use crate::core_session::{SessionPolicy, SessionResult};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "GAMETABLE";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub invites: InviteConfig,
    pub policy: SessionPolicy,
    pub logging: LogConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,

    /// Grace period for in-flight requests on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// SQLite store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file
    pub path: PathBuf,

    /// Maximum pooled connections
    pub pool_size: u32,

    /// How long a writer waits for the database lock
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

/// Invite code shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteConfig {
    /// Characters taken from the session name
    pub slug_len: usize,

    /// Random characters appended to the slug
    pub suffix_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/gametable.db"),
            pool_size: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for InviteConfig {
    fn default() -> Self {
        let generator = InviteCodeGenerator::default();
        Self {
            slug_len: generator.slug_len(),
            suffix_len: generator.suffix_len(),
        }
    }
}

impl InviteConfig {
    pub fn generator(&self) -> SessionResult<InviteCodeGenerator> {
        InviteCodeGenerator::new(self.slug_len, self.suffix_len)
    }
}

/// Parse `GAMETABLE_<key>` if it is set
fn env_override<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let name = format!("{}_{}", ENV_PREFIX, key);
    match env::var(&name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: GAMETABLE_<SECTION>_<KEY>
    /// Example: GAMETABLE_SERVER_BIND_ADDRESS=0.0.0.0:8080
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay any `GAMETABLE_*` variables onto `self`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(addr) = env_override("SERVER_BIND_ADDRESS")? {
            self.server.bind_address = addr;
        }
        if let Some(path) = env_override::<PathBuf>("STORE_PATH")? {
            self.store.path = path;
        }
        if let Some(size) = env_override("STORE_POOL_SIZE")? {
            self.store.pool_size = size;
        }
        if let Some(len) = env_override("INVITES_SLUG_LEN")? {
            self.invites.slug_len = len;
        }
        if let Some(len) = env_override("INVITES_SUFFIX_LEN")? {
            self.invites.suffix_len = len;
        }
        if let Some(count) = env_override("POLICY_COUNT_REPEAT_JOINS")? {
            self.policy.count_repeat_joins = count;
        }
        if let Some(accept) = env_override("POLICY_ARCHIVED_SESSIONS_ACCEPT_JOINS")? {
            self.policy.archived_sessions_accept_joins = accept;
        }
        if let Some(level) = env_override("LOG_LEVEL")? {
            self.logging.level = level;
        }
        if let Some(json) = env_override("LOG_JSON")? {
            self.logging.json_format = json;
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config: Self = toml::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "store.pool_size must be greater than 0".to_string(),
            ));
        }

        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed("store.path must be set".to_string()));
        }

        if self.invites.suffix_len == 0 {
            return Err(ConfigError::ValidationFailed(
                "invites.suffix_len must be greater than 0".to_string(),
            ));
        }

        if self.invites.slug_len + self.invites.suffix_len > MAX_CODE_LEN {
            return Err(ConfigError::ValidationFailed(format!(
                "invites.slug_len + invites.suffix_len must not exceed {}",
                MAX_CODE_LEN
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| ConfigError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.invites.slug_len, 6);
        assert_eq!(config.invites.suffix_len, 8);
        assert!(config.policy.count_repeat_joins);
        assert!(!config.policy.archived_sessions_accept_joins);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.store.pool_size = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.invites.suffix_len = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.invites.slug_len = 15;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gametable.toml");
        std::fs::write(
            &path,
            r#"
                [store]
                path = "/tmp/tables.db"
                busy_timeout = "250ms"

                [policy]
                count_repeat_joins = false

                [logging]
                level = "debug"
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/tables.db"));
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.store.pool_size, 8);
        assert!(!config.policy.count_repeat_joins);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gametable.toml");

        let mut config = Config::default();
        config.invites.slug_len = 4;
        config.save_to_file(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded.invites, config.invites);
        assert_eq!(reloaded.logging, config.logging);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[invites]\nsuffix_len = 0\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ConfigError::ValidationFailed(_))));
        assert!(matches!(
            Config::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
