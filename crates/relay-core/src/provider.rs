//! The chat provider abstraction.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::alert::Alert;
use crate::error::Result;

/// Outcome of pushing one batch of alerts.
///
/// Informational only: per-item failures are counted here and in metrics
/// but never turn a push into an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    /// Alerts in the batch.
    pub alerts: usize,
    /// Messages sent, or acknowledged in dry-run mode.
    pub sent: usize,
    /// Messages whose delivery failed.
    pub failed: usize,
    /// Alerts skipped because composition failed.
    pub skipped: usize,
}

impl PushSummary {
    /// Creates an empty summary for a batch of `alerts` alerts.
    #[must_use]
    pub const fn new(alerts: usize) -> Self {
        Self {
            alerts,
            sent: 0,
            failed: 0,
            skipped: 0,
        }
    }
}

/// A destination that alert batches are pushed to.
pub trait Provider: Send + Sync + fmt::Debug {
    /// Returns the provider kind.
    fn id(&self) -> &'static str;

    /// Returns the room this provider delivers to.
    fn room(&self) -> &str;

    /// Delivers a batch of alerts.
    ///
    /// Alerts are processed in order. A failure on one alert or message is
    /// recorded and the batch continues.
    ///
    /// # Errors
    ///
    /// Returns an error only if the batch could not be attempted at all.
    fn push<'a>(
        &'a self,
        alerts: &'a [Alert],
    ) -> Pin<Box<dyn Future<Output = Result<PushSummary>> + Send + 'a>>;
}
