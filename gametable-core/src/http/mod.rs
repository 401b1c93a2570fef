//! HTTP API for sessions, invites and character selection
//!
//! Callers identify themselves with the `x-user-id` header; errors come back
//! as `{ "error": <code>, "message": <text> }`.

pub mod api;
pub mod handlers;
pub mod server;
pub mod state;
pub mod types;

pub use api::build_router;
pub use handlers::USER_ID_HEADER;
pub use server::ApiServer;
pub use state::AppState;
