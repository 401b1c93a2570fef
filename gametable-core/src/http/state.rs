//! Shared state for the HTTP API

use crate::core_session::SessionService;

/// Server state shared across requests
#[derive(Clone)]
pub struct AppState {
    pub service: SessionService,
}

impl AppState {
    pub fn new(service: SessionService) -> Self {
        Self { service }
    }
}
