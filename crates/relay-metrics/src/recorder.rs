//! The recording seam consumed by chat providers.

use std::fmt;
use std::time::Duration;

use crate::prometheus::DispatchLabels;

/// Sink for per-message dispatch bookkeeping.
///
/// Providers receive an implementation at construction and call it once per
/// attempted message. Implementations must be cheap and must not fail.
pub trait DispatchRecorder: Send + Sync + fmt::Debug {
    /// Records that a message was attempted.
    fn record_dispatched(&self, labels: &DispatchLabels);

    /// Records that a message failed transport.
    fn record_failed(&self, labels: &DispatchLabels);

    /// Records how long an attempt took.
    fn record_duration(&self, labels: &DispatchLabels, elapsed: Duration);
}

/// A recorder that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl DispatchRecorder for NoopRecorder {
    fn record_dispatched(&self, _labels: &DispatchLabels) {}

    fn record_failed(&self, _labels: &DispatchLabels) {}

    fn record_duration(&self, _labels: &DispatchLabels, _elapsed: Duration) {}
}
