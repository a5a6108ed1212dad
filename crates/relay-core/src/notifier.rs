//! Routes alert batches to the provider registered for a room.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{info, warn};

use crate::alert::WebhookPayload;
use crate::error::{RelayError, Result};
use crate::provider::{Provider, PushSummary};

/// Maps rooms to providers.
///
/// The mapping is fixed at construction.
#[derive(Debug, Clone)]
pub struct Notifier {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl Notifier {
    /// Builds a notifier from one provider per room.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DuplicateRoom`] if two providers share a room.
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Result<Self> {
        let mut by_room = HashMap::with_capacity(providers.len());

        for provider in providers {
            match by_room.entry(provider.room().to_string()) {
                Entry::Occupied(entry) => {
                    return Err(RelayError::DuplicateRoom {
                        room: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    info!(room = %provider.room(), provider = provider.id(), "registered provider");
                    entry.insert(provider);
                }
            }
        }

        Ok(Self { providers: by_room })
    }

    /// Pushes a payload's alerts to the provider for `room`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownRoom`] if no provider is registered for
    /// the room. Nothing is sent in that case.
    pub async fn dispatch(&self, payload: &WebhookPayload, room: &str) -> Result<PushSummary> {
        let Some(provider) = self.providers.get(room) else {
            warn!(room = %room, "no provider registered for room");
            return Err(RelayError::UnknownRoom {
                room: room.to_string(),
            });
        };

        provider.push(&payload.alerts).await
    }

    /// Returns the registered rooms, sorted.
    #[must_use]
    pub fn rooms(&self) -> Vec<&str> {
        let mut rooms: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        rooms.sort_unstable();
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{Alert, AlertStatus};
    use crate::error::ErrorKind;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct RecordingProvider {
        room: String,
        pushes: AtomicUsize,
        alerts: AtomicUsize,
    }

    impl RecordingProvider {
        fn new(room: &str) -> Arc<Self> {
            Arc::new(Self {
                room: room.to_string(),
                ..Self::default()
            })
        }
    }

    impl Provider for RecordingProvider {
        fn id(&self) -> &'static str {
            "recording"
        }

        fn room(&self) -> &str {
            &self.room
        }

        fn push<'a>(
            &'a self,
            alerts: &'a [Alert],
        ) -> Pin<Box<dyn Future<Output = Result<PushSummary>> + Send + 'a>> {
            Box::pin(async move {
                self.pushes.fetch_add(1, Ordering::SeqCst);
                self.alerts.fetch_add(alerts.len(), Ordering::SeqCst);
                Ok(PushSummary {
                    sent: alerts.len(),
                    ..PushSummary::new(alerts.len())
                })
            })
        }
    }

    fn providers(list: &[&Arc<RecordingProvider>]) -> Vec<Arc<dyn Provider>> {
        list.iter()
            .map(|p| {
                let provider: Arc<dyn Provider> = (*p).clone();
                provider
            })
            .collect()
    }

    fn payload(count: usize) -> WebhookPayload {
        WebhookPayload::new(
            (0..count)
                .map(|i| Alert::new(format!("fp-{i}"), AlertStatus::Firing))
                .collect(),
        )
    }

    #[tokio::test]
    async fn dispatch_forwards_whole_batch() {
        let qa = RecordingProvider::new("qa");
        let ops = RecordingProvider::new("ops");
        let notifier = Notifier::new(providers(&[&qa, &ops])).unwrap();

        let summary = notifier.dispatch(&payload(3), "qa").await.unwrap();

        assert_eq!(summary.sent, 3);
        assert_eq!(qa.pushes.load(Ordering::SeqCst), 1);
        assert_eq!(qa.alerts.load(Ordering::SeqCst), 3);
        assert_eq!(ops.pushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_room_is_a_routing_error() {
        let qa = RecordingProvider::new("qa");
        let notifier = Notifier::new(providers(&[&qa])).unwrap();

        let err = notifier.dispatch(&payload(2), "prod").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Routing);
        assert_eq!(err.to_string(), "no provider configured for room: prod");
        assert_eq!(qa.pushes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_room_is_rejected() {
        let (first, second) = (RecordingProvider::new("qa"), RecordingProvider::new("qa"));
        let err = Notifier::new(providers(&[&first, &second])).unwrap_err();
        assert!(matches!(err, RelayError::DuplicateRoom { room } if room == "qa"));
    }

    #[test]
    fn rooms_are_sorted() {
        let (qa, alerts, ops) = (
            RecordingProvider::new("qa"),
            RecordingProvider::new("alerts"),
            RecordingProvider::new("ops"),
        );
        let notifier = Notifier::new(providers(&[&qa, &alerts, &ops])).unwrap();
        assert_eq!(notifier.rooms(), vec!["alerts", "ops", "qa"]);
    }

    #[tokio::test]
    async fn empty_batch_still_reaches_provider() {
        let qa = RecordingProvider::new("qa");
        let notifier = Notifier::new(providers(&[&qa])).unwrap();

        let summary = notifier.dispatch(&payload(0), "qa").await.unwrap();
        assert_eq!(summary, PushSummary::default());
        assert_eq!(qa.pushes.load(Ordering::SeqCst), 1);
    }
}
