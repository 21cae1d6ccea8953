//! In-memory adapter for development and testing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::adapter::ResourceAdapter;
use crate::core::descriptor::LoadOptions;
use crate::core::error::LoadError;

/// Failure modes programmable per url.
enum Fault {
    /// Fail every attempt.
    Always,
    /// Fail the next `n` attempts, then succeed.
    Times(u32),
    /// Never settle; only the supervisor deadline ends the attempt.
    Hang,
}

/// Adapter that "materializes" resources from memory with a configurable
/// latency, plus programmable faults. Stands in for platform adapters in
/// development and tests the way an in-memory backend does for a real queue.
#[derive(Default)]
pub struct StaticAdapter {
    latency: Duration,
    faults: Mutex<HashMap<String, Fault>>,
    calls: Mutex<HashMap<String, u64>>,
}

impl StaticAdapter {
    /// Adapter that settles successfully and immediately for every url.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle each attempt after `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every attempt for `url`.
    pub fn fail_always(&self, url: impl Into<String>) {
        self.faults.lock().insert(url.into(), Fault::Always);
    }

    /// Fail the next `times` attempts for `url`, then succeed.
    pub fn fail_times(&self, url: impl Into<String>, times: u32) {
        self.faults.lock().insert(url.into(), Fault::Times(times));
    }

    /// Never settle attempts for `url`.
    pub fn hang(&self, url: impl Into<String>) {
        self.faults.lock().insert(url.into(), Fault::Hang);
    }

    /// Number of load invocations observed for `url`.
    #[must_use]
    pub fn calls_for(&self, url: &str) -> u64 {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    /// Total load invocations across all urls.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.calls.lock().values().sum()
    }
}

enum Step {
    Succeed,
    Fail,
    Hang,
}

#[async_trait]
impl ResourceAdapter for StaticAdapter {
    async fn load(&self, url: &str, _options: &LoadOptions) -> Result<(), LoadError> {
        *self.calls.lock().entry(url.to_owned()).or_insert(0) += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let step = {
            let mut faults = self.faults.lock();
            let (step, exhausted) = match faults.get_mut(url) {
                None => (Step::Succeed, false),
                Some(Fault::Always) => (Step::Fail, false),
                Some(Fault::Hang) => (Step::Hang, false),
                Some(Fault::Times(n)) => {
                    if *n == 0 {
                        (Step::Succeed, true)
                    } else {
                        *n -= 1;
                        (Step::Fail, false)
                    }
                }
            };
            if exhausted {
                faults.remove(url);
            }
            step
        };
        match step {
            Step::Succeed => Ok(()),
            Step::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            Step::Fail => Err(LoadError::Failed {
                url: url.to_owned(),
                reason: "programmed fault".into(),
            }),
        }
    }
}
