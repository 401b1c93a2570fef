//! Gametable core: game sessions, invite codes and membership
//!
//! - [`core_session`]: domain model, SQLite stores and the `SessionService`
//! - [`http`]: axum router exposing the service as JSON endpoints
//! - [`config`], [`logging`], [`metrics`]: ambient setup shared by the binaries

pub mod config;
pub mod core_session;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod test_utils;

pub use config::Config;
pub use core_session::{InviteManager, SessionError, SessionManager, SessionResult, SessionService};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
