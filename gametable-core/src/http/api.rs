//! API routes definition

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Session routes
        .route("/sessions", post(handlers::create_session).get(handlers::list_sessions))
        .route("/sessions/:id", get(handlers::get_session).delete(handlers::delete_session))
        .route("/sessions/:id/archive", post(handlers::archive_session))
        .route("/sessions/:id/members/:user_id", delete(handlers::remove_member))
        // Invite routes
        .route("/sessions/:id/invites", post(handlers::create_invite).get(handlers::list_invites))
        .route("/invites/:code", get(handlers::get_invite))
        .route("/join", post(handlers::join))
        // Character routes
        .route("/characters/select", post(handlers::select_character))
        .with_state(state)
}
