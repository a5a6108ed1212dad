//! # relay-server
//!
//! HTTP front end of the alert relay. Alertmanager posts webhook
//! notifications here and each batch is relayed to the Google Chat room it
//! is addressed to.
//!
//! ## Example
//!
//! ```rust,no_run
//! use relay_server::{RelayConfig, RelayServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::from_file("config.toml")?;
//!     let server = RelayServer::from_config(&config)?;
//!     server
//!         .serve_with_shutdown(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/` | GET | Welcome text |
//! | `/ping` | GET | Liveness probe with build version |
//! | `/metrics` | GET | Prometheus metrics |
//! | `/dispatch?room_name=<room>` | POST | Relay an Alertmanager notification |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use config::{AppConfig, ProviderConfig, ProviderKind, RelayConfig};
pub use error::{ServerError, ServerResult};
pub use server::RelayServer;
pub use state::AppState;
