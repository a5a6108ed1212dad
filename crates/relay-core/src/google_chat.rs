//! Google Chat webhook provider.
//!
//! Each alert is bound to a thread through the provider's
//! [`ThreadRegistry`], rendered by its [`MessageComposer`] and posted to the
//! room's incoming webhook. Every POST asks Google Chat to reply in the
//! thread and to fall back to a new thread when the old one is gone. Flat
//! messages carry the thread key as a query parameter; card messages carry
//! it in the body.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use relay_metrics::{DispatchLabels, DispatchRecorder};
use reqwest::header::CONTENT_TYPE;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::Url;

use crate::alert::Alert;
use crate::composer::{MessageComposer, SchemaVersion};
use crate::error::{RelayError, Result};
use crate::message::ChatMessage;
use crate::provider::{Provider, PushSummary};
use crate::registry::{DEFAULT_SWEEP_INTERVAL, ThreadHandle, ThreadRegistry};

/// Provider kind reported by [`GoogleChatProvider`].
pub const PROVIDER_ID: &str = "google_chat";

/// Default idle connections kept per host.
pub const DEFAULT_MAX_IDLE_CONNS: usize = 50;

/// Default webhook request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default idle lifetime of a thread.
pub const DEFAULT_THREAD_TTL: Duration = Duration::from_secs(12 * 60 * 60);

const REPLY_OPTION_PARAM: &str = "messageReplyOption";
const REPLY_FALLBACK_TO_NEW_THREAD: &str = "REPLY_MESSAGE_FALLBACK_TO_NEW_THREAD";
const THREAD_KEY_PARAM: &str = "threadKey";

/// Settings for one Google Chat room.
#[derive(Debug, Clone)]
pub struct GoogleChatOptions {
    /// Room the provider is registered under.
    pub room: String,
    /// Incoming webhook URL.
    pub endpoint: String,
    /// Path of the message template.
    pub template: PathBuf,
    /// Wire schema to produce.
    pub schema: SchemaVersion,
    /// Idle connections kept per host.
    pub max_idle_conns: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Outbound proxy URL.
    pub proxy_url: Option<String>,
    /// Idle lifetime of a thread.
    pub thread_ttl: Duration,
    /// Skip network calls and only do the bookkeeping.
    pub dry_run: bool,
}

impl GoogleChatOptions {
    /// Creates options with default limits.
    #[must_use]
    pub fn new(
        room: impl Into<String>,
        endpoint: impl Into<String>,
        template: impl Into<PathBuf>,
    ) -> Self {
        Self {
            room: room.into(),
            endpoint: endpoint.into(),
            template: template.into(),
            schema: SchemaVersion::default(),
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            timeout: DEFAULT_TIMEOUT,
            proxy_url: None,
            thread_ttl: DEFAULT_THREAD_TTL,
            dry_run: false,
        }
    }

    /// Sets the wire schema.
    #[must_use]
    pub const fn with_schema(mut self, schema: SchemaVersion) -> Self {
        self.schema = schema;
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the outbound proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Sets the thread TTL.
    #[must_use]
    pub const fn with_thread_ttl(mut self, ttl: Duration) -> Self {
        self.thread_ttl = ttl;
        self
    }
}

/// Posts alerts to a Google Chat room.
#[derive(Debug)]
pub struct GoogleChatProvider {
    room: String,
    endpoint: Url,
    client: reqwest::Client,
    composer: MessageComposer,
    registry: Arc<ThreadRegistry>,
    recorder: Arc<dyn DispatchRecorder>,
    labels: DispatchLabels,
    dry_run: bool,
    prune_worker: JoinHandle<()>,
}

impl GoogleChatProvider {
    /// Builds the provider and starts its thread prune worker.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a startup error if the template cannot be loaded, or the
    /// endpoint or proxy URL is invalid.
    pub fn new(opts: GoogleChatOptions, recorder: Arc<dyn DispatchRecorder>) -> Result<Self> {
        let endpoint = Url::parse(&opts.endpoint).map_err(|e| RelayError::Config {
            reason: format!("invalid endpoint for room {}: {e}", opts.room),
        })?;

        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(opts.max_idle_conns)
            .timeout(opts.timeout);
        if let Some(proxy_url) = opts.proxy_url.as_deref().filter(|u| !u.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| RelayError::Config {
                reason: format!("invalid proxy URL: {e}"),
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|e| RelayError::Config {
            reason: format!("failed to build HTTP client: {e}"),
        })?;

        let composer = MessageComposer::from_file(&opts.template, opts.schema)?;

        let registry = Arc::new(ThreadRegistry::new());
        let prune_worker = registry.start_prune_worker(DEFAULT_SWEEP_INTERVAL, opts.thread_ttl);

        info!(
            room = %opts.room,
            template = %composer.template_name(),
            schema = %opts.schema,
            dry_run = opts.dry_run,
            "google chat provider ready"
        );

        Ok(Self {
            labels: DispatchLabels::new(PROVIDER_ID, opts.room.clone()),
            room: opts.room,
            endpoint,
            client,
            composer,
            registry,
            recorder,
            dry_run: opts.dry_run,
            prune_worker,
        })
    }

    /// Returns the provider's thread registry.
    #[must_use]
    pub fn threads(&self) -> &ThreadRegistry {
        &self.registry
    }

    async fn push_batch(&self, alerts: &[Alert]) -> PushSummary {
        info!(room = %self.room, count = alerts.len(), "dispatching alerts to google chat");
        let mut summary = PushSummary::new(alerts.len());

        for alert in alerts {
            let thread = self.registry.acquire(&alert.fingerprint);

            let messages = match self.composer.prepare(alert, &thread) {
                Ok(messages) => messages,
                Err(err) => {
                    error!(
                        room = %self.room,
                        fingerprint = %alert.fingerprint,
                        error = %err,
                        "failed to prepare message"
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            for message in &messages {
                let started = Instant::now();
                self.recorder.record_dispatched(&self.labels);

                let outcome = if self.dry_run {
                    info!(room = %self.room, "dry run enabled, skipping notification");
                    Ok(())
                } else {
                    self.send(message, &thread).await
                };

                self.recorder.record_duration(&self.labels, started.elapsed());

                match outcome {
                    Ok(()) => summary.sent += 1,
                    Err(err) => {
                        self.recorder.record_failed(&self.labels);
                        error!(
                            room = %self.room,
                            fingerprint = %alert.fingerprint,
                            error = %err,
                            "failed to send message"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        summary
    }

    /// Posts one message to the webhook.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the request fails or the webhook
    /// answers with a non-success status.
    pub async fn send(&self, message: &ChatMessage, thread: &ThreadHandle) -> Result<()> {
        let payload = message.to_payload()?;
        let url = self.request_url(message, thread);

        debug!(
            room = %self.room,
            url = %url,
            payload = %String::from_utf8_lossy(&payload),
            "sending message"
        );

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn request_url(&self, message: &ChatMessage, thread: &ThreadHandle) -> Url {
        let thread_key = thread.id().to_string();
        let mut params = vec![(REPLY_OPTION_PARAM, REPLY_FALLBACK_TO_NEW_THREAD)];
        if message.as_basic().is_some() {
            params.push((THREAD_KEY_PARAM, thread_key.as_str()));
        }
        with_query_params(&self.endpoint, &params)
    }
}

impl Drop for GoogleChatProvider {
    fn drop(&mut self) {
        self.prune_worker.abort();
    }
}

impl Provider for GoogleChatProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn room(&self) -> &str {
        &self.room
    }

    fn push<'a>(
        &'a self,
        alerts: &'a [Alert],
    ) -> Pin<Box<dyn Future<Output = Result<PushSummary>> + Send + 'a>> {
        Box::pin(async move { Ok(self.push_batch(alerts).await) })
    }
}

/// Sets query parameters on a URL, replacing any with the same name.
fn with_query_params(base: &Url, params: &[(&str, &str)]) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| !params.iter().any(|(p, _)| *p == &**name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept.iter().map(|(n, v)| (n.as_str(), v.as_str())))
        .extend_pairs(params.iter());
    url
}
