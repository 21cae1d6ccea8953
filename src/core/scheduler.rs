//! Priority queue, bounded admission, and per-url deduplication.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::core::adapter::AdapterSet;
use crate::core::descriptor::{LoadState, ResourceDescriptor};
use crate::core::error::LoadError;
use crate::core::stats::{SchedulerStats, StatsHub, StatsSubscription};
use crate::core::supervisor::{
    supervised_load, RetryPolicy, DEFAULT_LOAD_TIMEOUT, DEFAULT_RETRY_DELAY,
};

/// Abstraction for spawning load dispatch on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Host-reported network quality tier.
///
/// The signal is optional; when absent the default admission cap applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkQuality {
    /// Constrained link; serialize loads.
    Slow,
    /// Mid-tier link.
    Moderate,
    /// Unconstrained link.
    Fast,
}

/// Admission caps per network tier. Lowering a cap throttles future
/// admission only; active loads are never preempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyPolicy {
    /// Cap when the link is fast or no signal is available.
    pub default_cap: usize,
    /// Cap under [`NetworkQuality::Slow`].
    pub slow_cap: usize,
    /// Cap under [`NetworkQuality::Moderate`].
    pub moderate_cap: usize,
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        Self {
            default_cap: 6,
            slow_cap: 1,
            moderate_cap: 2,
        }
    }
}

impl ConcurrencyPolicy {
    /// Cap to apply under `quality`.
    #[must_use]
    pub const fn cap_for(&self, quality: NetworkQuality) -> usize {
        match quality {
            NetworkQuality::Slow => self.slow_cap,
            NetworkQuality::Moderate => self.moderate_cap,
            NetworkQuality::Fast => self.default_cap,
        }
    }
}

type LoadOutcome = Result<(), LoadError>;

/// Completion handle for one submitted url.
///
/// All submitters of the same in-flight url hold handles onto the same
/// attempt and observe one identical outcome.
pub struct LoadHandle {
    url: String,
    rx: oneshot::Receiver<LoadOutcome>,
}

impl LoadHandle {
    /// Url this handle settles for.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Suspend until the load settles.
    ///
    /// # Errors
    ///
    /// The final [`LoadError`] after retry exhaustion, or
    /// [`LoadError::Abandoned`] if the scheduler was dropped first.
    pub async fn settled(self) -> LoadOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(LoadError::Abandoned { url: self.url }),
        }
    }
}

/// Per-item outcome summary of a best-effort batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Descriptors submitted.
    pub attempted: usize,
    /// Urls that settled successfully.
    pub loaded: usize,
    /// Failed urls with their final error.
    pub failures: Vec<(String, LoadError)>,
}

impl BatchOutcome {
    /// Whether every member settled successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.loaded == self.attempted
    }
}

#[derive(PartialEq, Eq)]
enum Phase {
    Queued,
    Loading,
}

struct InFlightEntry {
    phase: Phase,
    waiters: Vec<oneshot::Sender<LoadOutcome>>,
}

/// Heap entry ordered by priority (highest first), FIFO within a class via a
/// monotonic arrival sequence.
struct QueuedLoad {
    descriptor: ResourceDescriptor,
    seq: u64,
}

impl PartialEq for QueuedLoad {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedLoad {}

impl PartialOrd for QueuedLoad {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedLoad {
    fn cmp(&self, other: &Self) -> Ordering {
        let mine = self.descriptor.priority.rank();
        let theirs = other.descriptor.priority.rank();
        match mine.cmp(&theirs) {
            // Earlier arrival wins within a class (reversed for max-heap).
            Ordering::Equal => other.seq.cmp(&self.seq),
            unequal => unequal,
        }
    }
}

struct SchedulerState {
    queue: BinaryHeap<QueuedLoad>,
    next_seq: u64,
    in_flight: HashMap<String, InFlightEntry>,
    loaded: HashSet<String>,
    failed: HashSet<String>,
    active: usize,
    max_concurrent: usize,
}

impl SchedulerState {
    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            loaded: self.loaded.len(),
            failed: self.failed.len(),
            queued: self
                .in_flight
                .values()
                .filter(|e| e.phase == Phase::Queued)
                .count(),
            active: self.active,
            max_concurrent: self.max_concurrent,
        }
    }
}

/// Priority-based resource-loading scheduler with bounded admission.
///
/// Sole owner of the queue, the dedup registry, and the stats snapshot.
/// Cheap to clone; clones share state.
pub struct ResourceScheduler<S> {
    inner: Arc<Mutex<SchedulerState>>,
    hub: Arc<StatsHub>,
    adapters: Arc<AdapterSet>,
    policy: ConcurrencyPolicy,
    retry_delay: Duration,
    default_timeout: Duration,
    spawner: S,
}

impl<S: Clone> Clone for ResourceScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            hub: Arc::clone(&self.hub),
            adapters: Arc::clone(&self.adapters),
            policy: self.policy,
            retry_delay: self.retry_delay,
            default_timeout: self.default_timeout,
            spawner: self.spawner.clone(),
        }
    }
}

impl<S> ResourceScheduler<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a scheduler with the default concurrency policy and timeouts.
    pub fn new(adapters: AdapterSet, spawner: S) -> Self {
        let policy = ConcurrencyPolicy::default();
        Self {
            inner: Arc::new(Mutex::new(SchedulerState {
                queue: BinaryHeap::new(),
                next_seq: 0,
                in_flight: HashMap::new(),
                loaded: HashSet::new(),
                failed: HashSet::new(),
                active: 0,
                max_concurrent: policy.default_cap,
            })),
            hub: Arc::new(StatsHub::new()),
            adapters: Arc::new(adapters),
            policy,
            retry_delay: DEFAULT_RETRY_DELAY,
            default_timeout: DEFAULT_LOAD_TIMEOUT,
            spawner,
        }
    }

    /// Replace the concurrency policy and reset the cap to its default tier.
    #[must_use]
    pub fn with_concurrency_policy(self, policy: ConcurrencyPolicy) -> Self {
        self.inner.lock().max_concurrent = policy.default_cap.max(1);
        Self { policy, ..self }
    }

    /// Set the deadline applied to descriptors that carry none.
    #[must_use]
    pub fn with_default_timeout(self, default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            ..self
        }
    }

    /// Set the flat delay between retry attempts.
    #[must_use]
    pub fn with_retry_delay(self, retry_delay: Duration) -> Self {
        Self { retry_delay, ..self }
    }

    /// Submit a descriptor, returning a completion handle.
    ///
    /// An already-loaded url resolves immediately without a new adapter
    /// invocation. A url with an in-flight attempt joins that attempt and
    /// shares its outcome. Anything else is queued by priority (FIFO within
    /// a class) and admission runs.
    pub fn submit(&self, descriptor: ResourceDescriptor) -> LoadHandle {
        let url = descriptor.url.clone();
        let (tx, rx) = oneshot::channel();
        let handle = LoadHandle {
            url: url.clone(),
            rx,
        };

        {
            let mut state = self.inner.lock();
            if state.loaded.contains(&url) {
                tracing::debug!(url = %url, "already loaded, resolving immediately");
                let _ = tx.send(Ok(()));
                return handle;
            }
            if let Some(entry) = state.in_flight.get_mut(&url) {
                tracing::debug!(url = %url, "joining in-flight load");
                entry.waiters.push(tx);
                return handle;
            }
            if self.adapters.supports(descriptor.kind) {
                let seq = state.next_seq;
                state.next_seq += 1;
                state.in_flight.insert(
                    url.clone(),
                    InFlightEntry {
                        phase: Phase::Queued,
                        waiters: vec![tx],
                    },
                );
                tracing::debug!(url = %url, priority = ?descriptor.priority, "queued");
                state.queue.push(QueuedLoad { descriptor, seq });
            } else {
                let kind = descriptor.kind.as_str();
                tracing::error!(url = %url, kind, "no adapter registered, rejecting");
                state.failed.insert(url);
                let _ = tx.send(Err(LoadError::UnsupportedType { kind: kind.into() }));
            }
        }
        self.publish_stats();
        self.process_queue();
        handle
    }

    /// Admit queued loads while capacity remains.
    ///
    /// Safe to call at any time; a no-op when the queue is empty or the cap
    /// is saturated.
    pub fn process_queue(&self) {
        loop {
            let descriptor = {
                let mut state = self.inner.lock();
                if state.active >= state.max_concurrent {
                    break;
                }
                match Self::pop_admissible(&mut state) {
                    Some(d) => d,
                    None => break,
                }
            };
            self.publish_stats();
            self.dispatch(descriptor);
        }
    }

    fn pop_admissible(state: &mut SchedulerState) -> Option<ResourceDescriptor> {
        while let Some(item) = state.queue.pop() {
            match state.in_flight.get_mut(&item.descriptor.url) {
                Some(entry) if entry.phase == Phase::Queued => {
                    entry.phase = Phase::Loading;
                    state.active += 1;
                    return Some(item.descriptor);
                }
                // Satisfied or superseded while queued.
                _ => tracing::debug!(url = %item.descriptor.url, "skipping stale queue entry"),
            }
        }
        None
    }

    fn dispatch(&self, descriptor: ResourceDescriptor) {
        let Some(adapter) = self.adapters.get(descriptor.kind) else {
            // Registration is checked at submit; the registry is immutable
            // afterwards, so this arm is unreachable in practice.
            let kind = descriptor.kind.as_str().to_owned();
            self.settle(&descriptor.url, Err(LoadError::UnsupportedType { kind }));
            return;
        };
        let deadline = descriptor
            .timeout_ms
            .map_or(self.default_timeout, Duration::from_millis);
        let policy = RetryPolicy {
            max_retries: descriptor.max_retries,
            retry_delay: self.retry_delay,
        };
        let load_id = uuid::Uuid::new_v4();
        let this = self.clone();
        self.spawner.spawn(async move {
            tracing::debug!(%load_id, url = descriptor.url.as_str(), "dispatching");
            let outcome = supervised_load(adapter.as_ref(), &descriptor, deadline, policy).await;
            this.settle(&descriptor.url, outcome);
        });
    }

    fn settle(&self, url: &str, outcome: LoadOutcome) {
        let waiters = {
            let mut state = self.inner.lock();
            state.active = state.active.saturating_sub(1);
            match &outcome {
                Ok(()) => {
                    tracing::info!(url, "loaded");
                    state.loaded.insert(url.to_owned());
                    state.failed.remove(url);
                }
                Err(err) => {
                    tracing::warn!(url, error = %err, "settled as failure");
                    state.failed.insert(url.to_owned());
                }
            }
            state
                .in_flight
                .remove(url)
                .map(|entry| entry.waiters)
                .unwrap_or_default()
        };
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
        self.publish_stats();
        // Re-enter admission on a fresh task so settlement never recurses
        // into a long queue on this stack.
        let this = self.clone();
        self.spawner.spawn(async move { this.process_queue() });
    }

    /// Set the admission cap and immediately re-run admission so freed
    /// capacity is used. Never cancels active work; a cap of 0 is clamped
    /// to 1.
    pub fn set_concurrency_limit(&self, cap: usize) {
        let cap = cap.max(1);
        {
            let mut state = self.inner.lock();
            if state.max_concurrent == cap {
                return;
            }
            tracing::info!(cap, "concurrency limit changed");
            state.max_concurrent = cap;
        }
        self.publish_stats();
        self.process_queue();
    }

    /// Apply the cap mapped to `quality` by the concurrency policy.
    pub fn apply_network_quality(&self, quality: NetworkQuality) {
        self.set_concurrency_limit(self.policy.cap_for(quality));
    }

    /// Submit every descriptor and wait for all of them, best-effort.
    ///
    /// Never fails as a whole; individual failures are logged and reported
    /// per-url in the outcome. Callers must not infer success from
    /// settlement alone.
    pub async fn preload_batch(&self, descriptors: Vec<ResourceDescriptor>) -> BatchOutcome {
        let handles: Vec<LoadHandle> = descriptors.into_iter().map(|d| self.submit(d)).collect();
        let mut outcome = BatchOutcome {
            attempted: handles.len(),
            ..BatchOutcome::default()
        };
        let urls: Vec<String> = handles.iter().map(|h| h.url().to_owned()).collect();
        let settled = futures::future::join_all(handles.into_iter().map(LoadHandle::settled)).await;
        for (url, result) in urls.into_iter().zip(settled) {
            match result {
                Ok(()) => outcome.loaded += 1,
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "batch member failed");
                    outcome.failures.push((url, err));
                }
            }
        }
        outcome
    }

    /// Whether `url` is in the sticky loaded set.
    #[must_use]
    pub fn is_loaded(&self, url: &str) -> bool {
        self.inner.lock().loaded.contains(url)
    }

    /// Whether `url` is in the advisory failed set.
    #[must_use]
    pub fn has_failed(&self, url: &str) -> bool {
        self.inner.lock().failed.contains(url)
    }

    /// Lifecycle state of `url`.
    #[must_use]
    pub fn load_state(&self, url: &str) -> LoadState {
        let state = self.inner.lock();
        if state.loaded.contains(url) {
            return LoadState::Loaded;
        }
        match state.in_flight.get(url) {
            Some(entry) if entry.phase == Phase::Loading => LoadState::Loading,
            Some(_) => LoadState::Queued,
            None if state.failed.contains(url) => LoadState::Failed,
            None => LoadState::Unknown,
        }
    }

    /// Current stats snapshot.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.inner.lock().snapshot()
    }

    /// Register a stats listener. It receives one synchronous snapshot
    /// immediately, then change-suppressed broadcasts on every mutation.
    pub fn on_stats_change<F>(&self, listener: F) -> StatsSubscription
    where
        F: Fn(&SchedulerStats) + Send + Sync + 'static,
    {
        self.hub.subscribe(self.stats(), listener)
    }

    fn publish_stats(&self) {
        let snapshot = self.inner.lock().snapshot();
        self.hub.publish(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::Priority;

    fn load(url: &str, priority: Priority, seq: u64) -> QueuedLoad {
        QueuedLoad {
            descriptor: ResourceDescriptor::new(url, crate::core::descriptor::ResourceKind::Fetch)
                .with_priority(priority),
            seq,
        }
    }

    #[test]
    fn heap_orders_by_priority_then_arrival() {
        let mut heap = BinaryHeap::new();
        heap.push(load("a", Priority::Low, 0));
        heap.push(load("b", Priority::Critical, 1));
        heap.push(load("c", Priority::High, 2));
        heap.push(load("d", Priority::High, 3));
        heap.push(load("e", Priority::Prefetch, 4));

        let order: Vec<String> = std::iter::from_fn(|| heap.pop())
            .map(|q| q.descriptor.url)
            .collect();
        assert_eq!(order, ["b", "c", "d", "a", "e"]);
    }

    #[test]
    fn concurrency_policy_maps_tiers() {
        let policy = ConcurrencyPolicy::default();
        assert_eq!(policy.cap_for(NetworkQuality::Slow), 1);
        assert_eq!(policy.cap_for(NetworkQuality::Moderate), 2);
        assert_eq!(policy.cap_for(NetworkQuality::Fast), policy.default_cap);
    }
}
