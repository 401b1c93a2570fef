//! Error types for the logging subsystem

use std::fmt;

/// Errors raised while configuring logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// A global subscriber was already installed
    InitializationFailed(String),
    /// Unrecognised level name
    InvalidLevel(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize logging: {}", msg)
            }
            LoggingError::InvalidLevel(level) => {
                write!(
                    f,
                    "Unknown log level '{}' (expected trace, debug, info, warn or error)",
                    level
                )
            }
        }
    }
}

impl std::error::Error for LoggingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_error_display() {
        let err = LoggingError::InitializationFailed("already set".to_string());
        assert_eq!(err.to_string(), "Failed to initialize logging: already set");

        let err = LoggingError::InvalidLevel("loud".to_string());
        assert!(err.to_string().starts_with("Unknown log level 'loud'"));
    }
}
