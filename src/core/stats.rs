//! Change-suppressed publication of scheduler snapshots.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Point-in-time scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Urls settled successfully.
    pub loaded: usize,
    /// Urls in the advisory failed set.
    pub failed: usize,
    /// Accepted urls waiting for a concurrency slot.
    pub queued: usize,
    /// Attempts currently in flight.
    pub active: usize,
    /// Current admission cap.
    pub max_concurrent: usize,
}

/// Subscriber callback invoked with each broadcast snapshot.
pub type StatsCallback = dyn Fn(&SchedulerStats) + Send + Sync;

struct HubState {
    subscribers: HashMap<u64, Arc<StatsCallback>>,
    next_id: u64,
    last_broadcast: Option<SchedulerStats>,
}

/// Subscriber registry with field-by-field change suppression.
///
/// A snapshot is broadcast only when it differs from the last one sent; a
/// newly registered subscriber always receives one synchronous snapshot so it
/// never observes "no data".
pub struct StatsHub {
    state: Arc<Mutex<HubState>>,
}

impl Default for StatsHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                subscribers: HashMap::new(),
                next_id: 0,
                last_broadcast: None,
            })),
        }
    }

    /// Register a listener, delivering `current` to it synchronously before
    /// returning. The subscription stays live until
    /// [`StatsSubscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, current: SchedulerStats, listener: F) -> StatsSubscription
    where
        F: Fn(&SchedulerStats) + Send + Sync + 'static,
    {
        let listener: Arc<StatsCallback> = Arc::new(listener);
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.insert(id, Arc::clone(&listener));
            state.last_broadcast = Some(current);
            id
        };
        // Initial snapshot outside the lock: listeners are free to call back
        // into the scheduler.
        listener(&current);
        StatsSubscription {
            id,
            hub: Arc::downgrade(&self.state),
        }
    }

    /// Broadcast `snapshot` unless it equals the last broadcast value.
    pub fn publish(&self, snapshot: SchedulerStats) {
        let listeners: Vec<Arc<StatsCallback>> = {
            let mut state = self.state.lock();
            if state.last_broadcast == Some(snapshot) {
                return;
            }
            state.last_broadcast = Some(snapshot);
            state.subscribers.values().cloned().collect()
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

/// Handle returned by [`StatsHub::subscribe`]; call
/// [`unsubscribe`](Self::unsubscribe) to stop receiving broadcasts.
///
/// Dropping the handle does NOT unsubscribe; the listener stays registered
/// for the lifetime of the scheduler, matching fire-and-forget dashboards.
#[must_use]
pub struct StatsSubscription {
    id: u64,
    hub: Weak<Mutex<HubState>>,
}

impl StatsSubscription {
    /// Remove the listener from the hub. Idempotent; a no-op after the
    /// scheduler is gone.
    pub fn unsubscribe(self) {
        if let Some(state) = self.hub.upgrade() {
            state.lock().subscribers.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_listener() -> (Arc<AtomicUsize>, impl Fn(&SchedulerStats) + Send + Sync) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_: &SchedulerStats| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn subscriber_receives_initial_snapshot_synchronously() {
        let hub = StatsHub::new();
        let (count, listener) = counting_listener();
        let _sub = hub.subscribe(SchedulerStats::default(), listener);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn identical_snapshot_is_suppressed() {
        let hub = StatsHub::new();
        let (count, listener) = counting_listener();
        let _sub = hub.subscribe(SchedulerStats::default(), listener);
        hub.publish(SchedulerStats::default());
        hub.publish(SchedulerStats::default());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn changed_snapshot_is_broadcast() {
        let hub = StatsHub::new();
        let (count, listener) = counting_listener();
        let _sub = hub.subscribe(SchedulerStats::default(), listener);
        hub.publish(SchedulerStats {
            loaded: 1,
            ..SchedulerStats::default()
        });
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_broadcasts() {
        let hub = StatsHub::new();
        let (count, listener) = counting_listener();
        let sub = hub.subscribe(SchedulerStats::default(), listener);
        sub.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(SchedulerStats {
            active: 2,
            ..SchedulerStats::default()
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
