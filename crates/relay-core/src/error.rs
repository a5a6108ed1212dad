//! Error types for the relay-core crate.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while routing, composing or delivering alerts.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No provider is registered for the requested room.
    #[error("no provider configured for room: {room}")]
    UnknownRoom {
        /// The room that was requested.
        room: String,
    },

    /// Rendering the message template failed.
    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),

    /// The rendered template is not a valid card message.
    #[error("invalid card message: {reason}")]
    InvalidCard {
        /// The reason the card could not be decoded.
        reason: String,
    },

    /// The webhook answered with a non-success status.
    #[error("non-success response from webhook: {status}")]
    UpstreamStatus {
        /// The HTTP status code returned.
        status: u16,
    },

    /// The webhook request could not be completed.
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A message could not be serialized into its wire payload.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The message template could not be loaded or compiled.
    #[error("failed to load template {path}: {reason}")]
    TemplateLoad {
        /// Path of the template file.
        path: String,
        /// The reason loading failed.
        reason: String,
    },

    /// Provider configuration is invalid.
    #[error("invalid provider configuration: {reason}")]
    Config {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// Two providers were registered for the same room.
    #[error("duplicate provider for room: {room}")]
    DuplicateRoom {
        /// The room claimed twice.
        room: String,
    },
}

/// Coarse classification of a [`RelayError`].
///
/// Routing and startup errors surface to callers; composition and transport
/// errors are isolated to a single alert or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The room has no registered provider.
    Routing,
    /// Template render or card decoding failed for one alert.
    Composition,
    /// Sending one message failed.
    Transport,
    /// A provider or router could not be constructed.
    Startup,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Routing => write!(f, "routing"),
            Self::Composition => write!(f, "composition"),
            Self::Transport => write!(f, "transport"),
            Self::Startup => write!(f, "startup"),
        }
    }
}

impl RelayError {
    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownRoom { .. } => ErrorKind::Routing,
            Self::Render(_) | Self::InvalidCard { .. } => ErrorKind::Composition,
            Self::UpstreamStatus { .. } | Self::Request(_) | Self::Serialization(_) => {
                ErrorKind::Transport
            }
            Self::TemplateLoad { .. } | Self::Config { .. } | Self::DuplicateRoom { .. } => {
                ErrorKind::Startup
            }
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
