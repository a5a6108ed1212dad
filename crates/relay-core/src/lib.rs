//! Alertmanager to Google Chat dispatch core.
//!
//! `relay-core` takes alert batches delivered by Alertmanager's webhook
//! receiver and turns them into threaded Google Chat messages.
//!
//! # Components
//!
//! - **[`ThreadRegistry`]**: binds each alert fingerprint to a stable thread
//!   so follow-up notifications land in the same conversation, expiring idle
//!   threads after a TTL
//! - **[`MessageComposer`]**: renders an alert through a Jinja template into
//!   flat text messages or structured card messages
//! - **[`Widget`]**: card content, decoded by which key a JSON object carries
//! - **[`GoogleChatProvider`]**: posts composed messages to a room's
//!   webhook, with dry-run support and per-message metrics
//! - **[`Notifier`]**: picks the provider registered for a room
//!
//! # Example
//!
//! ```rust
//! use relay_core::{Alert, AlertStatus, MessageComposer, SchemaVersion, ThreadRegistry};
//!
//! let composer = MessageComposer::from_source(
//!     "inline.tmpl",
//!     "{{ labels.alertname | Title }} is {{ status | toUpper }}",
//!     SchemaVersion::V1,
//! )
//! .unwrap();
//!
//! let registry = ThreadRegistry::new();
//! let alert = Alert::new("c8f2b1a0", AlertStatus::Firing).label("alertname", "disk full");
//! let thread = registry.acquire(&alert.fingerprint);
//!
//! let messages = composer.prepare(&alert, &thread).unwrap();
//! assert_eq!(messages[0].as_basic().unwrap().text, "Disk Full is FIRING");
//! ```
//!
//! Failures are classified by [`ErrorKind`]: only routing and startup errors
//! reach callers, while composition and transport failures are logged,
//! counted and skipped.

#![forbid(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/relay-core/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod alert;
pub mod composer;
pub mod error;
pub mod google_chat;
pub mod message;
pub mod notifier;
pub mod provider;
pub mod registry;
pub mod widget;

// Re-export main types at crate root
pub use alert::{Alert, AlertStatus, WebhookPayload};
pub use composer::{MAX_TEXT_CHARS, MessageComposer, SchemaVersion};
pub use error::{ErrorKind, RelayError, Result};
pub use google_chat::{GoogleChatOptions, GoogleChatProvider, PROVIDER_ID};
pub use message::{
    BasicMessage, Card, CardEntry, CardHeader, CardMessage, ChatMessage, Section, Thread,
};
pub use notifier::Notifier;
pub use provider::{Provider, PushSummary};
pub use registry::{DEFAULT_SWEEP_INTERVAL, ThreadHandle, ThreadId, ThreadRegistry};
pub use widget::{ColumnItem, Columns, DecoratedText, TextParagraph, Widget};
