//! HTTP server

use super::api::build_router;
use super::state::AppState;
use crate::core_session::SessionService;
use anyhow::Result;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// HTTP front end over a [`SessionService`]
pub struct ApiServer {
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown_timeout: Duration,
}

impl ApiServer {
    pub fn new(service: SessionService, addr: SocketAddr) -> Self {
        Self {
            state: Arc::new(AppState::new(service)),
            addr,
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Serve until Ctrl-C, then drain in-flight requests for up to the
    /// shutdown timeout
    pub async fn run(self) -> Result<()> {
        let router = build_router(self.state);

        let listener = TcpListener::bind(self.addr).await?;
        info!("Gametable API listening on {}", listener.local_addr()?);

        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();
        let shutdown_timeout = self.shutdown_timeout;

        tokio::select! {
            result = serve => result?,
            _ = async {
                shutdown_signal().await;
                tokio::time::sleep(shutdown_timeout).await;
            } => warn!("shutdown timeout elapsed with requests still in flight"),
        }

        info!("Gametable API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
