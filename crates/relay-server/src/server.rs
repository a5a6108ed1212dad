//! Relay server implementation.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::{AppConfig, RelayConfig};
use crate::error::{ServerError, ServerResult};
use crate::routes::create_router;
use crate::state::AppState;

/// HTTP server accepting Alertmanager webhooks.
#[derive(Debug, Clone)]
pub struct RelayServer {
    state: Arc<AppState>,
    config: AppConfig,
}

impl RelayServer {
    /// Create a server from prepared state.
    #[must_use]
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self {
            state: Arc::new(state),
            config,
        }
    }

    /// Build the server and all providers from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider cannot be constructed.
    pub fn from_config(config: &RelayConfig) -> ServerResult<Self> {
        let state = AppState::from_config(config)?;
        Ok(Self::new(config.app.clone(), state))
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided future completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;

        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while running.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!(addr = %addr, rooms = ?self.state.notifier().rooms(), "alert relay listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!("alert relay shut down");
        Ok(())
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state), &self.config)
    }
}
