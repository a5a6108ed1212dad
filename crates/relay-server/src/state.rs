//! Shared state for the relay server.

use std::sync::Arc;
use std::time::Instant;

use relay_core::{GoogleChatProvider, Notifier, Provider};
use relay_metrics::PrometheusRegistry;
use tracing::info;

use crate::config::{ProviderKind, RelayConfig};
use crate::error::ServerResult;

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    notifier: Notifier,
    metrics: PrometheusRegistry,
    start_time: Instant,
}

impl AppState {
    /// Creates state from a ready notifier and metrics registry.
    #[must_use]
    pub fn new(notifier: Notifier, metrics: PrometheusRegistry) -> Self {
        Self {
            notifier,
            metrics,
            start_time: Instant::now(),
        }
    }

    /// Builds one provider per configured room and the notifier routing to
    /// them.
    ///
    /// Must be called from within a Tokio runtime, since every provider
    /// starts its thread prune worker.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider cannot be constructed.
    pub fn from_config(config: &RelayConfig) -> ServerResult<Self> {
        let metrics = PrometheusRegistry::new();
        let mut providers: Vec<Arc<dyn Provider>> = Vec::with_capacity(config.providers.len());

        for (room, settings) in &config.providers {
            let provider: Arc<dyn Provider> = match settings.kind {
                ProviderKind::GoogleChat => Arc::new(GoogleChatProvider::new(
                    settings.to_options(room),
                    metrics.recorder(),
                )?),
            };
            providers.push(provider);
        }

        let notifier = Notifier::new(providers)?;
        info!(rooms = ?notifier.rooms(), "providers initialised");

        Ok(Self::new(notifier, metrics))
    }

    /// Returns the notifier.
    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Returns the metrics registry.
    #[must_use]
    pub const fn metrics(&self) -> &PrometheusRegistry {
        &self.metrics
    }

    /// Returns seconds since the state was created.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
