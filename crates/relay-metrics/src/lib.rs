//! Dispatch metrics for the alert relay.
#![forbid(unsafe_code)]
//!
//! `relay-metrics` owns the Prometheus families that describe outbound chat
//! deliveries. Providers never touch the families directly; they record
//! through the [`DispatchRecorder`] trait, which keeps the storage behind the
//! seam and lets tests swap in [`NoopRecorder`].
//!
//! # Example
//!
//! ```rust
//! use relay_metrics::{DispatchLabels, DispatchRecorder, PrometheusRegistry};
//! use std::time::Duration;
//!
//! let registry = PrometheusRegistry::new();
//! let labels = DispatchLabels::new("google_chat", "prod_alerts");
//!
//! let recorder = registry.dispatch();
//! recorder.record_dispatched(&labels);
//! recorder.record_duration(&labels, Duration::from_millis(40));
//!
//! let output = registry.encode();
//! assert!(output.contains("alerts_dispatched_total"));
//! ```

#![doc(html_root_url = "https://docs.rs/relay-metrics/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod prometheus;
pub mod recorder;

// Re-export main types at crate root
pub use prometheus::{DispatchLabels, DispatchMetrics, PrometheusRegistry};
pub use recorder::{DispatchRecorder, NoopRecorder};
