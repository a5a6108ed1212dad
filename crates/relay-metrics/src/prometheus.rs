//! Prometheus metrics for outbound chat deliveries.
//!
//! Every message a provider attempts is counted and timed under the
//! `{provider, room}` label pair:
//! - `alerts_dispatched_total`: messages attempted (including dry-run)
//! - `alerts_dispatched_errors_total`: messages that failed transport
//! - `alerts_dispatched_duration_seconds`: time spent per attempt
//!
//! # Example
//!
//! ```rust
//! use relay_metrics::{DispatchLabels, PrometheusRegistry};
//!
//! let registry = PrometheusRegistry::new();
//! let labels = DispatchLabels::new("google_chat", "qa");
//!
//! registry.dispatch().inc_dispatched(&labels);
//! registry.dispatch().inc_errors(&labels);
//!
//! assert_eq!(registry.dispatch().dispatched_total(&labels), 1);
//! assert_eq!(registry.dispatch().errors_total(&labels), 1);
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

use crate::recorder::DispatchRecorder;

/// Label set shared by all dispatch metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DispatchLabels {
    /// The provider kind (e.g., "`google_chat`").
    pub provider: String,
    /// The room the provider was registered under.
    pub room: String,
}

impl DispatchLabels {
    /// Creates a label set for a provider and room.
    #[must_use]
    pub fn new(provider: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            room: room.into(),
        }
    }
}

type DurationFamily = Family<DispatchLabels, Histogram, fn() -> Histogram>;

// 5ms, 10ms, 20ms ... ~10s. Webhook calls are bounded by the client timeout.
fn duration_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.005, 2.0, 12))
}

/// Counters and histograms for chat message dispatch.
#[derive(Clone)]
pub struct DispatchMetrics {
    /// Messages attempted, per provider and room.
    dispatched: Family<DispatchLabels, Counter>,
    /// Messages that failed to send, per provider and room.
    errors: Family<DispatchLabels, Counter>,
    /// Time taken per attempt, per provider and room.
    duration: DurationFamily,
}

impl std::fmt::Debug for DispatchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMetrics").finish_non_exhaustive()
    }
}

impl DispatchMetrics {
    /// Creates dispatch metrics and registers them with the given registry.
    fn new(registry: &mut Registry) -> Self {
        // The text encoder appends `_total` to counters.
        let dispatched = Family::<DispatchLabels, Counter>::default();
        registry.register(
            "alerts_dispatched",
            "Number of chat messages dispatched",
            dispatched.clone(),
        );

        let errors = Family::<DispatchLabels, Counter>::default();
        registry.register(
            "alerts_dispatched_errors",
            "Number of chat messages that failed to dispatch",
            errors.clone(),
        );

        let duration: DurationFamily =
            Family::new_with_constructor(duration_histogram as fn() -> Histogram);
        registry.register(
            "alerts_dispatched_duration_seconds",
            "Time taken to dispatch a chat message",
            duration.clone(),
        );

        Self {
            dispatched,
            errors,
            duration,
        }
    }

    /// Increments the dispatched counter.
    pub fn inc_dispatched(&self, labels: &DispatchLabels) {
        self.dispatched.get_or_create(labels).inc();
    }

    /// Increments the error counter.
    pub fn inc_errors(&self, labels: &DispatchLabels) {
        self.errors.get_or_create(labels).inc();
    }

    /// Records a dispatch duration.
    pub fn observe_duration(&self, labels: &DispatchLabels, elapsed: Duration) {
        self.duration
            .get_or_create(labels)
            .observe(elapsed.as_secs_f64());
    }

    /// Returns the number of dispatched messages for a label set.
    #[must_use]
    pub fn dispatched_total(&self, labels: &DispatchLabels) -> u64 {
        self.dispatched.get_or_create(labels).get()
    }

    /// Returns the number of failed messages for a label set.
    #[must_use]
    pub fn errors_total(&self, labels: &DispatchLabels) -> u64 {
        self.errors.get_or_create(labels).get()
    }
}

impl DispatchRecorder for DispatchMetrics {
    fn record_dispatched(&self, labels: &DispatchLabels) {
        self.inc_dispatched(labels);
    }

    fn record_failed(&self, labels: &DispatchLabels) {
        self.inc_errors(labels);
    }

    fn record_duration(&self, labels: &DispatchLabels, elapsed: Duration) {
        self.observe_duration(labels, elapsed);
    }
}

/// Registry holding every relay metric, ready for text exposition.
#[derive(Clone)]
pub struct PrometheusRegistry {
    /// The underlying prometheus-client registry.
    registry: Arc<RwLock<Registry>>,
    /// Dispatch metrics.
    dispatch: DispatchMetrics,
}

impl std::fmt::Debug for PrometheusRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusRegistry")
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl Default for PrometheusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusRegistry {
    /// Creates a registry with all relay metrics registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let dispatch = DispatchMetrics::new(&mut registry);

        Self {
            registry: Arc::new(RwLock::new(registry)),
            dispatch,
        }
    }

    /// Returns the dispatch metrics.
    #[must_use]
    pub fn dispatch(&self) -> &DispatchMetrics {
        &self.dispatch
    }

    /// Returns a shareable recorder handle backed by this registry.
    #[must_use]
    pub fn recorder(&self) -> Arc<dyn DispatchRecorder> {
        Arc::new(self.dispatch.clone())
    }

    /// Encodes all metrics in Prometheus text format.
    ///
    /// This output can be served directly from a `/metrics` HTTP endpoint.
    #[must_use]
    pub fn encode(&self) -> String {
        let registry = self.registry.read();
        let mut buffer = String::new();
        if encode(&mut buffer, &registry).is_err() {
            tracing::error!("failed to encode prometheus metrics");
            return String::new();
        }
        buffer
    }

    /// Returns the Content-Type header value for Prometheus metrics.
    #[must_use]
    pub const fn content_type() -> &'static str {
        "text/plain; version=0.0.4; charset=utf-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn labels() -> DispatchLabels {
        DispatchLabels::new("google_chat", "qa")
    }

    #[test]
    fn new_registry_starts_at_zero() {
        let registry = PrometheusRegistry::new();
        assert_eq!(registry.dispatch().dispatched_total(&labels()), 0);
        assert_eq!(registry.dispatch().errors_total(&labels()), 0);
    }

    #[test]
    fn cloned_registry_shares_state() {
        let registry1 = PrometheusRegistry::new();
        let registry2 = registry1.clone();

        registry1.dispatch().inc_dispatched(&labels());
        registry2.dispatch().inc_dispatched(&labels());

        assert_eq!(registry1.dispatch().dispatched_total(&labels()), 2);
    }

    #[test]
    fn recorder_handle_writes_into_registry() {
        let registry = PrometheusRegistry::new();
        let recorder = registry.recorder();

        recorder.record_dispatched(&labels());
        recorder.record_failed(&labels());
        recorder.record_duration(&labels(), Duration::from_millis(12));

        assert_eq!(registry.dispatch().dispatched_total(&labels()), 1);
        assert_eq!(registry.dispatch().errors_total(&labels()), 1);
    }

    #[test]
    fn labels_are_kept_apart() {
        let registry = PrometheusRegistry::new();
        let qa = DispatchLabels::new("google_chat", "qa");
        let prod = DispatchLabels::new("google_chat", "prod");

        registry.dispatch().inc_dispatched(&qa);
        registry.dispatch().inc_dispatched(&qa);
        registry.dispatch().inc_dispatched(&prod);

        assert_eq!(registry.dispatch().dispatched_total(&qa), 2);
        assert_eq!(registry.dispatch().dispatched_total(&prod), 1);
    }

    #[test_case("alerts_dispatched_total" ; "dispatched counter")]
    #[test_case("alerts_dispatched_errors_total" ; "error counter")]
    #[test_case("alerts_dispatched_duration_seconds_count" ; "duration histogram")]
    fn encode_includes_metric(name: &str) {
        let registry = PrometheusRegistry::new();
        registry.dispatch().inc_dispatched(&labels());
        registry.dispatch().inc_errors(&labels());
        registry
            .dispatch()
            .observe_duration(&labels(), Duration::from_millis(30));

        let output = registry.encode();
        assert!(output.contains(name), "missing {name} in:\n{output}");
    }

    #[test]
    fn encode_renders_labels() {
        let registry = PrometheusRegistry::new();
        registry.dispatch().inc_dispatched(&labels());

        let output = registry.encode();
        assert!(output.contains(r#"alerts_dispatched_total{provider="google_chat",room="qa"} 1"#));
    }

    #[test]
    fn content_type_is_prometheus_text() {
        assert!(PrometheusRegistry::content_type().starts_with("text/plain"));
    }
}
