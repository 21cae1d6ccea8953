//! Observational performance monitoring against static targets.
//!
//! The monitor stores externally delivered timing values and compares them
//! to fixed thresholds. It never gates, retries, or otherwise influences the
//! scheduler.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Static table of named metric thresholds, in the metric's own unit
/// (milliseconds for the default start-up set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceTargets {
    targets: BTreeMap<String, f64>,
}

impl Default for PerformanceTargets {
    /// The standard start-up metric set.
    fn default() -> Self {
        let mut targets = BTreeMap::new();
        targets.insert("first_paint_ms".to_owned(), 1_800.0);
        targets.insert("largest_paint_ms".to_owned(), 2_500.0);
        targets.insert("interactive_ms".to_owned(), 3_800.0);
        targets.insert("startup_total_ms".to_owned(), 3_000.0);
        targets.insert("long_task_ms".to_owned(), 50.0);
        Self { targets }
    }
}

impl PerformanceTargets {
    /// Empty target table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            targets: BTreeMap::new(),
        }
    }

    /// Add or replace a target.
    #[must_use]
    pub fn with_target(mut self, metric: impl Into<String>, threshold: f64) -> Self {
        self.targets.insert(metric.into(), threshold);
        self
    }

    /// Threshold for `metric`, if one is configured.
    #[must_use]
    pub fn threshold(&self, metric: &str) -> Option<f64> {
        self.targets.get(metric).copied()
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.targets.iter()
    }
}

/// A recorded instance of a metric exceeding its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breach {
    /// Metric name.
    pub metric: String,
    /// Observed value.
    pub value: f64,
    /// Configured threshold it exceeded.
    pub target: f64,
}

/// One metric's entry in a point-in-time report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    /// Latest observed value, if any was delivered.
    pub value: Option<f64>,
    /// Configured threshold.
    pub target: f64,
    /// Whether the latest value exceeds the threshold.
    pub breached: bool,
}

/// Point-in-time report over the fixed named-metric set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Reading per configured metric.
    pub metrics: BTreeMap<String, MetricReading>,
}

impl PerformanceReport {
    /// Number of currently breached metrics.
    #[must_use]
    pub fn breach_count(&self) -> usize {
        self.metrics.values().filter(|m| m.breached).count()
    }
}

/// Listener invoked with each breach as it is observed.
pub type BreachCallback = dyn Fn(&Breach) + Send + Sync;

struct MonitorState {
    latest: HashMap<String, f64>,
    subscribers: HashMap<u64, Arc<BreachCallback>>,
    next_id: u64,
}

/// Independent observer of externally supplied timing signals.
///
/// Last-write-wins per metric, no history. Breach lists are derived on
/// demand from the latest values; nothing is persisted across calls.
pub struct PerformanceMonitor {
    targets: PerformanceTargets,
    state: Arc<Mutex<MonitorState>>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(PerformanceTargets::default())
    }
}

impl PerformanceMonitor {
    /// Create a monitor over `targets`.
    #[must_use]
    pub fn new(targets: PerformanceTargets) -> Self {
        Self {
            targets,
            state: Arc::new(Mutex::new(MonitorState {
                latest: HashMap::new(),
                subscribers: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Record an externally delivered measurement, last-write-wins.
    ///
    /// Notifies subscribers when the value exceeds its configured target.
    /// Metrics without a target are stored but never breach.
    pub fn record(&self, metric: impl Into<String>, value: f64) {
        let metric = metric.into();
        let listeners: Option<(Breach, Vec<Arc<BreachCallback>>)> = {
            let mut state = self.state.lock();
            state.latest.insert(metric.clone(), value);
            self.targets
                .threshold(&metric)
                .filter(|target| value > *target)
                .map(|target| {
                    tracing::warn!(metric = %metric, value, target, "performance target breached");
                    (
                        Breach {
                            metric: metric.clone(),
                            value,
                            target,
                        },
                        state.subscribers.values().cloned().collect(),
                    )
                })
        };
        if let Some((breach, subscribers)) = listeners {
            for listener in subscribers {
                listener(&breach);
            }
        }
    }

    /// Latest value recorded for `metric`.
    #[must_use]
    pub fn latest(&self, metric: &str) -> Option<f64> {
        self.state.lock().latest.get(metric).copied()
    }

    /// Breaches derived from the latest values, on demand.
    #[must_use]
    pub fn get_breaches(&self) -> Vec<Breach> {
        let state = self.state.lock();
        self.targets
            .iter()
            .filter_map(|(metric, target)| {
                let value = state.latest.get(metric).copied()?;
                (value > *target).then(|| Breach {
                    metric: metric.clone(),
                    value,
                    target: *target,
                })
            })
            .collect()
    }

    /// Point-in-time report over the configured metric set.
    #[must_use]
    pub fn get_report(&self) -> PerformanceReport {
        let state = self.state.lock();
        let metrics = self
            .targets
            .iter()
            .map(|(metric, target)| {
                let value = state.latest.get(metric).copied();
                (
                    metric.clone(),
                    MetricReading {
                        value,
                        target: *target,
                        breached: value.is_some_and(|v| v > *target),
                    },
                )
            })
            .collect();
        PerformanceReport { metrics }
    }

    /// Register a breach listener; returns a handle whose
    /// [`unsubscribe`](PerfSubscription::unsubscribe) removes it.
    pub fn subscribe<F>(&self, listener: F) -> PerfSubscription
    where
        F: Fn(&Breach) + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, Arc::new(listener));
        PerfSubscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }
}

/// Handle returned by [`PerformanceMonitor::subscribe`].
#[must_use]
pub struct PerfSubscription {
    id: u64,
    state: Weak<Mutex<MonitorState>>,
}

impl PerfSubscription {
    /// Remove the listener. Idempotent; a no-op after the monitor is gone.
    pub fn unsubscribe(self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().subscribers.remove(&self.id);
        }
    }
}
