//! Alertmanager webhook payload types.
//!
//! These mirror the JSON body Alertmanager posts to webhook receivers
//! (payload version 4). Labels and annotations are kept in sorted maps so
//! templates iterate them in a stable order.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The status of an alert or alert group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// The alert condition is active.
    #[default]
    Firing,
    /// The alert condition has cleared.
    Resolved,
}

impl AlertStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert as delivered by Alertmanager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Whether the alert is firing or resolved.
    #[serde(default)]
    pub status: AlertStatus,
    /// Identifying labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Informational annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// When the alert started firing.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// When the alert ended.
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Link back to the alert source.
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
    /// Stable identifier of the alert condition.
    #[serde(default)]
    pub fingerprint: String,
}

impl Alert {
    /// Creates an alert with the given fingerprint and status.
    #[must_use]
    pub fn new(fingerprint: impl Into<String>, status: AlertStatus) -> Self {
        Self {
            status,
            fingerprint: fingerprint.into(),
            ..Self::default()
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Returns the `alertname` label, if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.labels.get("alertname").map(String::as_str)
    }

    /// Returns true if the alert is firing.
    #[must_use]
    pub fn is_firing(&self) -> bool {
        self.status == AlertStatus::Firing
    }
}

/// The body of an Alertmanager webhook notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Payload format version.
    #[serde(default)]
    pub version: String,
    /// Key identifying the alert group.
    #[serde(default)]
    pub group_key: String,
    /// Number of alerts dropped by Alertmanager's `max_alerts`.
    #[serde(default)]
    pub truncated_alerts: usize,
    /// Status of the group as a whole.
    #[serde(default)]
    pub status: AlertStatus,
    /// Name of the Alertmanager receiver.
    #[serde(default)]
    pub receiver: String,
    /// Labels the group was formed on.
    #[serde(default)]
    pub group_labels: BTreeMap<String, String>,
    /// Labels shared by every alert.
    #[serde(default)]
    pub common_labels: BTreeMap<String, String>,
    /// Annotations shared by every alert.
    #[serde(default)]
    pub common_annotations: BTreeMap<String, String>,
    /// Alertmanager's external URL.
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
    /// The alerts in this notification.
    pub alerts: Vec<Alert>,
}

impl WebhookPayload {
    /// Creates a payload carrying the given alerts.
    #[must_use]
    pub fn new(alerts: Vec<Alert>) -> Self {
        let status = if alerts.iter().any(Alert::is_firing) {
            AlertStatus::Firing
        } else {
            AlertStatus::Resolved
        };

        Self {
            version: "4".to_string(),
            status,
            alerts,
            ..Self::default()
        }
    }
}
