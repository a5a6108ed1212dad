//! Relay configuration.
//!
//! The configuration is a TOML file with an `[app]` table for the HTTP
//! server and one `[providers.<room>]` table per chat room:
//!
//! ```toml
//! [app]
//! address = "0.0.0.0:6000"
//!
//! [providers.prod_alerts]
//! type = "google_chat"
//! endpoint = "https://chat.googleapis.com/v1/spaces/AAAA/messages?key=k&token=t"
//! template = "static/message.tmpl"
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use relay_core::{GoogleChatOptions, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_address")]
    pub address: SocketAddr,
    /// Request timeout in seconds.
    #[serde(default = "default_server_timeout_secs")]
    pub server_timeout_secs: u64,
    /// Log every HTTP request.
    #[serde(default = "default_true")]
    pub enable_request_logs: bool,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log")]
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            server_timeout_secs: default_server_timeout_secs(),
            enable_request_logs: true,
            log: default_log(),
        }
    }
}

impl AppConfig {
    /// Returns the request timeout.
    #[must_use]
    pub const fn server_timeout(&self) -> Duration {
        Duration::from_secs(self.server_timeout_secs)
    }
}

/// Kind of chat provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Chat incoming webhook.
    #[default]
    GoogleChat,
}

/// Settings for one room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider kind.
    #[serde(rename = "type", default)]
    pub kind: ProviderKind,
    /// Incoming webhook URL.
    pub endpoint: String,
    /// Idle connections kept per host.
    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,
    /// Webhook request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Outbound proxy URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Path of the message template.
    pub template: PathBuf,
    /// Idle lifetime of a thread in seconds.
    #[serde(default = "default_thread_ttl_secs")]
    pub thread_ttl_secs: u64,
    /// Skip network calls.
    #[serde(default)]
    pub dry_run: bool,
    /// Wire schema.
    #[serde(default)]
    pub version: SchemaVersion,
}

impl ProviderConfig {
    /// Converts the settings into provider options for `room`.
    #[must_use]
    pub fn to_options(&self, room: &str) -> GoogleChatOptions {
        GoogleChatOptions {
            room: room.to_string(),
            endpoint: self.endpoint.clone(),
            template: self.template.clone(),
            schema: self.version,
            max_idle_conns: self.max_idle_conns,
            timeout: Duration::from_secs(self.timeout_secs),
            proxy_url: self.proxy_url.clone(),
            thread_ttl: Duration::from_secs(self.thread_ttl_secs),
            dry_run: self.dry_run,
        }
    }
}

/// Main relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub app: AppConfig,
    /// Providers keyed by room.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ServerError::Config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> ServerResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ServerError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> ServerResult<()> {
        if self.app.server_timeout_secs == 0 {
            return Err(ServerError::Config(
                "app.server_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.providers.is_empty() {
            return Err(ServerError::Config("no providers configured".to_string()));
        }

        for (room, provider) in &self.providers {
            if room.is_empty() {
                return Err(ServerError::Config("room name cannot be empty".to_string()));
            }
            if provider.endpoint.trim().is_empty() {
                return Err(ServerError::Config(format!(
                    "providers.{room}.endpoint cannot be empty"
                )));
            }
            if provider.template.as_os_str().is_empty() {
                return Err(ServerError::Config(format!(
                    "providers.{room}.template cannot be empty"
                )));
            }
            if provider.timeout_secs == 0 {
                return Err(ServerError::Config(format!(
                    "providers.{room}.timeout_secs must be greater than 0"
                )));
            }
            if provider.thread_ttl_secs == 0 {
                return Err(ServerError::Config(format!(
                    "providers.{room}.thread_ttl_secs must be greater than 0"
                )));
            }
        }

        Ok(())
    }
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 6000))
}

const fn default_server_timeout_secs() -> u64 {
    5
}

const fn default_true() -> bool {
    true
}

fn default_log() -> String {
    "info".to_string()
}

const fn default_max_idle_conns() -> usize {
    50
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_thread_ttl_secs() -> u64 {
    12 * 60 * 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    const MINIMAL: &str = r#"
        [providers.prod_alerts]
        endpoint = "https://chat.googleapis.com/v1/spaces/AAAA/messages?key=k&token=t"
        template = "static/message.tmpl"
    "#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_applies_defaults() {
        let config = RelayConfig::from_toml(MINIMAL).unwrap();

        assert_eq!(config.app, AppConfig::default());
        assert_eq!(config.app.address.port(), 6000);
        assert_eq!(config.app.server_timeout(), Duration::from_secs(5));

        let provider = &config.providers["prod_alerts"];
        assert_eq!(provider.kind, ProviderKind::GoogleChat);
        assert_eq!(provider.max_idle_conns, 50);
        assert_eq!(provider.timeout_secs, 30);
        assert_eq!(provider.thread_ttl_secs, 43_200);
        assert_eq!(provider.version, SchemaVersion::V1);
        assert!(provider.proxy_url.is_none());
        assert!(!provider.dry_run);
    }

    #[test]
    fn full_config() {
        let toml = r#"
            [app]
            address = "127.0.0.1:7000"
            server_timeout_secs = 10
            enable_request_logs = false
            log = "debug"

            [providers.qa]
            type = "google_chat"
            endpoint = "https://chat.googleapis.com/v1/spaces/QA/messages"
            max_idle_conns = 10
            timeout_secs = 5
            proxy_url = "http://squid:3128"
            template = "static/message_v2.tmpl"
            thread_ttl_secs = 3600
            dry_run = true
            version = "v2"

            [providers.ops]
            endpoint = "https://chat.googleapis.com/v1/spaces/OPS/messages"
            template = "static/message.tmpl"
        "#;

        let config = RelayConfig::from_toml(toml).unwrap();
        assert_eq!(config.app.address.to_string(), "127.0.0.1:7000");
        assert!(!config.app.enable_request_logs);
        assert_eq!(config.app.log, "debug");
        assert_eq!(config.providers.len(), 2);

        let opts = config.providers["qa"].to_options("qa");
        assert_eq!(opts.room, "qa");
        assert_eq!(opts.schema, SchemaVersion::V2);
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert_eq!(opts.thread_ttl, Duration::from_secs(3600));
        assert_eq!(opts.proxy_url.as_deref(), Some("http://squid:3128"));
        assert_eq!(opts.max_idle_conns, 10);
        assert!(opts.dry_run);
    }

    #[test]
    fn load_from_file() {
        let file = create_temp_config(MINIMAL);
        let config = RelayConfig::from_file(file.path()).unwrap();
        assert!(config.providers.contains_key("prod_alerts"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = RelayConfig::from_file("/nonexistent/relay.toml").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn no_providers_is_rejected() {
        let err = RelayConfig::from_toml("[app]\nlog = \"info\"\n").unwrap_err();
        assert!(err.to_string().contains("no providers configured"));
    }

    #[test_case("endpoint = \"\"\ntemplate = \"t.tmpl\"", "endpoint cannot be empty" ; "empty endpoint")]
    #[test_case("endpoint = \"https://x\"\ntemplate = \"\"", "template cannot be empty" ; "empty template")]
    #[test_case("endpoint = \"https://x\"\ntemplate = \"t.tmpl\"\ntimeout_secs = 0", "timeout_secs must be greater than 0" ; "zero timeout")]
    #[test_case("endpoint = \"https://x\"\ntemplate = \"t.tmpl\"\nthread_ttl_secs = 0", "thread_ttl_secs must be greater than 0" ; "zero ttl")]
    #[test_case("endpoint = \"https://x\"\ntemplate = \"t.tmpl\"\nversion = \"v3\"", "invalid TOML" ; "unknown version")]
    #[test_case("type = \"slack\"\nendpoint = \"https://x\"\ntemplate = \"t.tmpl\"", "invalid TOML" ; "unknown provider type")]
    fn invalid_provider_is_rejected(body: &str, expected: &str) {
        let toml = format!("[providers.qa]\n{body}\n");
        let err = RelayConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");
    }

    #[test]
    fn zero_server_timeout_is_rejected() {
        let toml = format!("[app]\nserver_timeout_secs = 0\n{MINIMAL}");
        assert!(RelayConfig::from_toml(&toml).is_err());
    }

    #[test]
    fn sample_config_is_valid() {
        let sample = include_str!("../../../config.sample.toml");
        let config = RelayConfig::from_toml(sample).unwrap();
        assert!(!config.providers.is_empty());
    }
}
