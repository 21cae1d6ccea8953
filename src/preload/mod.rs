//! Start-up sequencing of named descriptor groups and route prefetch.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::descriptor::ResourceDescriptor;
use crate::core::error::LoadError;
use crate::core::scheduler::{BatchOutcome, LoadHandle, ResourceScheduler, Spawn};

/// Stage of the start-up preload sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreloadStage {
    /// Sequence not yet started.
    NotStarted,
    /// Critical group in flight; every member must succeed.
    LoadingCritical,
    /// Critical group fully settled successfully.
    CriticalReady,
    /// Essential group in flight, best-effort.
    LoadingEssential,
    /// Non-critical group in flight, best-effort.
    LoadingNonCritical,
    /// Sequence finished.
    Complete,
    /// A critical member failed; the sequence was aborted.
    Failed,
}

impl PreloadStage {
    /// Progress percentage reported for this stage. Weights are fixed:
    /// critical settled = 40, essential settled = 70, complete = 100.
    #[must_use]
    pub const fn progress(self) -> u8 {
        match self {
            Self::NotStarted | Self::LoadingCritical | Self::Failed => 0,
            Self::CriticalReady | Self::LoadingEssential => 40,
            Self::LoadingNonCritical => 70,
            Self::Complete => 100,
        }
    }
}

/// Named descriptor groups driving the start-up sequence, plus a registry of
/// per-route prefetch sets.
#[derive(Debug, Default, Clone)]
pub struct PreloadPlan {
    critical: Vec<ResourceDescriptor>,
    essential: Vec<ResourceDescriptor>,
    non_critical: Vec<ResourceDescriptor>,
    routes: HashMap<String, Vec<ResourceDescriptor>>,
}

impl PreloadPlan {
    /// Empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the critical group. Any member failure aborts the sequence.
    #[must_use]
    pub fn critical(mut self, descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        self.critical = descriptors.into_iter().collect();
        self
    }

    /// Set the essential group, loaded best-effort after the critical group.
    #[must_use]
    pub fn essential(mut self, descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        self.essential = descriptors.into_iter().collect();
        self
    }

    /// Set the non-critical group, loaded best-effort last.
    #[must_use]
    pub fn non_critical(
        mut self,
        descriptors: impl IntoIterator<Item = ResourceDescriptor>,
    ) -> Self {
        self.non_critical = descriptors.into_iter().collect();
        self
    }

    /// Register a named route prefetch set.
    #[must_use]
    pub fn route(
        mut self,
        name: impl Into<String>,
        descriptors: impl IntoIterator<Item = ResourceDescriptor>,
    ) -> Self {
        self.routes
            .insert(name.into(), descriptors.into_iter().collect());
        self
    }
}

/// Outcome of a named route prefetch.
///
/// An unknown route is an explicit variant rather than a silent no-op so
/// callers can distinguish "route not registered" from "attempted".
#[derive(Debug)]
pub enum RoutePreload {
    /// No route registered under the requested name.
    UnknownRoute,
    /// Route descriptors were submitted; per-item results inside.
    Completed(BatchOutcome),
}

/// Orchestrates ordered groups of scheduler submissions for start-up
/// sequencing and route prefetch. A pure consumer of the scheduler's
/// submission API.
pub struct CriticalResourcePreloader<S> {
    scheduler: Arc<ResourceScheduler<S>>,
    plan: PreloadPlan,
    stage: Mutex<PreloadStage>,
}

impl<S> CriticalResourcePreloader<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a preloader over `scheduler` with `plan`.
    pub fn new(scheduler: Arc<ResourceScheduler<S>>, plan: PreloadPlan) -> Self {
        Self {
            scheduler,
            plan,
            stage: Mutex::new(PreloadStage::NotStarted),
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> PreloadStage {
        *self.stage.lock()
    }

    /// Progress percentage for the current stage.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.stage().progress()
    }

    fn transition(&self, next: PreloadStage) {
        let mut stage = self.stage.lock();
        tracing::info!(from = ?*stage, to = ?next, progress = next.progress(), "preload stage");
        *stage = next;
    }

    /// Run the start-up sequence.
    ///
    /// The critical group must fully and successfully settle before the
    /// essential and non-critical groups are dispatched; those settle
    /// per-item with failures caught and logged.
    ///
    /// # Errors
    ///
    /// The first critical member's error; the sequence is aborted and no
    /// later group is dispatched.
    pub async fn run(&self) -> Result<(), LoadError> {
        {
            // Check-and-transition under one lock: the sequence is single-shot.
            let mut stage = self.stage.lock();
            if *stage != PreloadStage::NotStarted {
                tracing::warn!(stage = ?*stage, "preload sequence already started, ignoring");
                return Ok(());
            }
            tracing::info!(from = ?*stage, to = ?PreloadStage::LoadingCritical, "preload stage");
            *stage = PreloadStage::LoadingCritical;
        }

        let handles: Vec<LoadHandle> = self
            .plan
            .critical
            .iter()
            .cloned()
            .map(|d| self.scheduler.submit(d))
            .collect();
        let settled = futures::future::join_all(handles.into_iter().map(LoadHandle::settled)).await;
        if let Some(err) = settled.into_iter().find_map(Result::err) {
            tracing::error!(error = %err, "critical resource failed, aborting start-up sequence");
            self.transition(PreloadStage::Failed);
            return Err(err);
        }
        self.transition(PreloadStage::CriticalReady);

        self.transition(PreloadStage::LoadingEssential);
        let essential = self.scheduler.preload_batch(self.plan.essential.clone()).await;
        tracing::info!(
            loaded = essential.loaded,
            failed = essential.failures.len(),
            "essential group settled"
        );

        self.transition(PreloadStage::LoadingNonCritical);
        let non_critical = self
            .scheduler
            .preload_batch(self.plan.non_critical.clone())
            .await;
        tracing::info!(
            loaded = non_critical.loaded,
            failed = non_critical.failures.len(),
            "non-critical group settled"
        );

        self.transition(PreloadStage::Complete);
        Ok(())
    }

    /// Prefetch the descriptors registered for `name`, best-effort.
    pub async fn preload_route(&self, name: &str) -> RoutePreload {
        let Some(descriptors) = self.plan.routes.get(name) else {
            tracing::warn!(route = name, "unknown route, nothing to prefetch");
            return RoutePreload::UnknownRoute;
        };
        tracing::debug!(route = name, count = descriptors.len(), "prefetching route");
        RoutePreload::Completed(self.scheduler.preload_batch(descriptors.clone()).await)
    }
}
