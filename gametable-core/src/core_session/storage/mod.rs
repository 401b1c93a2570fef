//! Storage layer for sessions, members, invites and character bindings
//!
//! `SessionSqlStore` owns the connection pool. The per-table stores borrow a
//! connection (normally an open transaction) so one service call can span
//! all of them atomically.

pub mod character_store;
pub mod invite_store;
pub mod membership_store;
pub mod migrations;
pub mod sql_store;

pub use character_store::SessionCharacterStore;
pub use invite_store::InviteStore;
pub use membership_store::MembershipStore;
pub use migrations::{migrate, CURRENT_SESSION_SCHEMA_VERSION};
pub use sql_store::SessionSqlStore;
