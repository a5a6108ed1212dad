//! Per-fingerprint chat thread registry.
//!
//! The [`ThreadRegistry`] binds every Alertmanager fingerprint to a stable
//! thread identity so repeated notifications for the same alert condition
//! land in one conversation. Records are refreshed whenever the fingerprint
//! is touched and expire once idle for longer than the configured TTL.
//!
//! Expiry is sweep based: a background task wakes every sweep interval and
//! drops idle records, so an idle record may outlive its TTL by up to one
//! sweep interval.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

/// Interval between prune sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Identity of a chat thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(Uuid);

impl ThreadId {
    /// Generates a new random thread identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// The thread an alert should be posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadHandle {
    id: ThreadId,
    existing: bool,
}

impl ThreadHandle {
    /// Creates a handle for a thread.
    #[must_use]
    pub const fn new(id: ThreadId, existing: bool) -> Self {
        Self { id, existing }
    }

    /// Returns the thread identity.
    #[must_use]
    pub const fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns true if the thread existed before it was acquired.
    #[must_use]
    pub const fn is_existing(&self) -> bool {
        self.existing
    }
}

#[derive(Debug)]
struct ThreadRecord {
    id: ThreadId,
    last_seen: Instant,
}

/// Maps alert fingerprints to thread identities.
///
/// All state sits behind a single mutex; request handlers and the prune
/// worker take the same lock for every read, write and sweep.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: Mutex<HashMap<String, ThreadRecord>>,
}

impl ThreadRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the thread for a fingerprint without creating or touching it.
    #[must_use]
    pub fn lookup(&self, fingerprint: &str) -> Option<ThreadId> {
        self.threads.lock().get(fingerprint).map(|record| record.id)
    }

    /// Returns the thread for a fingerprint, creating it if absent.
    ///
    /// An existing thread keeps its identity; only its idle timer is reset.
    pub fn add(&self, fingerprint: &str) -> ThreadId {
        self.acquire(fingerprint).id()
    }

    /// Looks up or creates the thread for a fingerprint in one step.
    ///
    /// Concurrent callers for the same fingerprint all observe the identity
    /// created by whichever caller took the lock first; only that caller sees
    /// [`ThreadHandle::is_existing`] as `false`.
    pub fn acquire(&self, fingerprint: &str) -> ThreadHandle {
        let now = Instant::now();
        let mut threads = self.threads.lock();

        match threads.entry(fingerprint.to_string()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.last_seen = now;
                ThreadHandle::new(record.id, true)
            }
            Entry::Vacant(entry) => {
                let id = ThreadId::new();
                entry.insert(ThreadRecord { id, last_seen: now });
                debug!(fingerprint = %fingerprint, thread = %id, "created alert thread");
                ThreadHandle::new(id, false)
            }
        }
    }

    /// Removes every record idle for longer than `ttl`.
    ///
    /// Returns the number of records removed.
    pub fn prune(&self, ttl: Duration) -> usize {
        self.prune_at(Instant::now(), ttl)
    }

    fn prune_at(&self, now: Instant, ttl: Duration) -> usize {
        let mut threads = self.threads.lock();
        let before = threads.len();
        threads.retain(|_, record| now.saturating_duration_since(record.last_seen) <= ttl);
        before - threads.len()
    }

    /// Returns the number of live threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.lock().len()
    }

    /// Returns true if no thread is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.lock().is_empty()
    }

    /// Spawns the background sweep that expires idle threads.
    ///
    /// The first sweep runs one `sweep_interval` after the call. The worker
    /// holds a weak reference and stops once the registry is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime or if `sweep_interval` is zero.
    pub fn start_prune_worker(
        self: &Arc<Self>,
        sweep_interval: Duration,
        ttl: Duration,
    ) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + sweep_interval, sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(registry) = registry.upgrade() else {
                    debug!("thread registry dropped, stopping prune worker");
                    break;
                };

                let removed = registry.prune(ttl);
                if removed > 0 {
                    info!(removed, remaining = registry.len(), "pruned idle alert threads");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn lookup_unknown_fingerprint() {
        let registry = ThreadRegistry::new();
        assert!(registry.lookup("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_does_not_create() {
        let registry = ThreadRegistry::new();
        let _ = registry.lookup("fp");
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn add_then_lookup() {
        let registry = ThreadRegistry::new();
        let id = registry.add("fp");

        assert_eq!(registry.lookup("fp"), Some(id));
        assert!(!id.to_string().is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let registry = ThreadRegistry::new();
        let first = registry.add("fp");
        let second = registry.add("fp");

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn acquire_reports_existing_thread() {
        let registry = ThreadRegistry::new();

        let created = registry.acquire("fp");
        assert!(!created.is_existing());

        let reused = registry.acquire("fp");
        assert!(reused.is_existing());
        assert_eq!(created.id(), reused.id());
    }

    #[test]
    fn thread_id_renders_as_hyphenated_uuid() {
        let id = ThreadId::new();
        let rendered = id.to_string();

        assert_eq!(rendered.len(), 36);
        assert_eq!(Uuid::parse_str(&rendered).ok().as_ref(), Some(id.as_uuid()));
    }

    #[test]
    fn concurrent_add_converges_on_one_thread() {
        let registry = Arc::new(ThreadRegistry::new());

        let handles: Vec<ThreadHandle> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..16)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    scope.spawn(move || registry.acquire("shared"))
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let ids: HashSet<ThreadId> = handles.iter().map(ThreadHandle::id).collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(handles.iter().filter(|h| !h.is_existing()).count(), 1);
        assert_eq!(registry.lookup("shared"), ids.into_iter().next());
    }

    #[test]
    fn prune_keeps_records_within_ttl() {
        let registry = ThreadRegistry::new();
        registry.add("fp");

        let ttl = Duration::from_secs(600);
        let removed = registry.prune_at(Instant::now() + ttl - Duration::from_millis(1), ttl);

        assert_eq!(removed, 0);
        assert!(registry.lookup("fp").is_some());
    }

    #[test]
    fn prune_drops_idle_records() {
        let registry = ThreadRegistry::new();
        registry.add("old");

        let ttl = Duration::from_secs(600);
        let removed = registry.prune_at(Instant::now() + ttl + Duration::from_secs(1), ttl);

        assert_eq!(removed, 1);
        assert!(registry.lookup("old").is_none());
    }

    #[test]
    fn pruned_fingerprint_gets_a_new_thread() {
        let registry = ThreadRegistry::new();
        let first = registry.add("fp");

        let ttl = Duration::from_secs(1);
        registry.prune_at(Instant::now() + Duration::from_secs(5), ttl);

        let second = registry.acquire("fp");
        assert!(!second.is_existing());
        assert_ne!(first, second.id());
    }

    #[tokio::test(start_paused = true)]
    async fn worker_expires_idle_threads_on_sweep() {
        let registry = Arc::new(ThreadRegistry::new());
        registry.add("fp");

        let sweep = Duration::from_secs(60);
        let ttl = Duration::from_secs(150);
        let _worker = registry.start_prune_worker(sweep, ttl);

        // Sweeps at 60s and 120s find the record younger than the TTL.
        tokio::time::sleep(Duration::from_secs(179)).await;
        assert!(registry.lookup("fp").is_some());

        // The sweep at 180s is the first one past the TTL.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(registry.lookup("fp").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn touching_a_thread_delays_expiry() {
        let registry = Arc::new(ThreadRegistry::new());
        let id = registry.add("fp");

        let _worker = registry.start_prune_worker(Duration::from_secs(60), Duration::from_secs(150));

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(registry.add("fp"), id);

        tokio::time::sleep(Duration::from_secs(81)).await;
        assert_eq!(registry.lookup("fp"), Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn worker_stops_when_registry_dropped() {
        let registry = Arc::new(ThreadRegistry::new());
        let worker = registry.start_prune_worker(Duration::from_secs(10), Duration::from_secs(10));

        drop(registry);

        let finished = tokio::time::timeout(Duration::from_secs(30), worker).await;
        assert!(finished.is_ok());
    }

    proptest! {
        #[test]
        fn distinct_fingerprints_get_distinct_threads(
            fingerprints in prop::collection::hash_set("[a-f0-9]{16}", 1..50)
        ) {
            let registry = ThreadRegistry::new();
            let ids: HashSet<ThreadId> = fingerprints.iter().map(|fp| registry.add(fp)).collect();

            prop_assert_eq!(ids.len(), fingerprints.len());
            prop_assert_eq!(registry.len(), fingerprints.len());
        }
    }
}
