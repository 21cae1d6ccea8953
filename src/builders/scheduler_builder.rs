//! Builder to construct a scheduler from configuration and adapters.

use std::sync::Arc;
use std::time::Duration;

use crate::config::LoaderConfig;
use crate::core::adapter::{AdapterSet, ResourceAdapter};
use crate::core::descriptor::ResourceKind;
use crate::core::error::LoadError;
use crate::core::scheduler::{ResourceScheduler, Spawn};

/// Builds a [`ResourceScheduler`] from validated configuration.
///
/// There are no global accessors; application start-up owns the one
/// scheduler instance and injects it where needed.
pub struct SchedulerBuilder<S> {
    config: LoaderConfig,
    adapters: AdapterSet,
    spawner: S,
}

impl<S> SchedulerBuilder<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Start a builder with the default configuration.
    pub fn new(spawner: S) -> Self {
        Self {
            config: LoaderConfig::default(),
            adapters: AdapterSet::new(),
            spawner,
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an adapter for `kind`.
    #[must_use]
    pub fn register_adapter(mut self, kind: ResourceKind, adapter: Arc<dyn ResourceAdapter>) -> Self {
        self.adapters.register(kind, adapter);
        self
    }

    /// Validate the configuration and build the scheduler.
    ///
    /// # Errors
    ///
    /// [`LoadError::Config`] when validation fails.
    pub fn build(self) -> Result<ResourceScheduler<S>, LoadError> {
        self.config.validate().map_err(LoadError::Config)?;
        Ok(ResourceScheduler::new(self.adapters, self.spawner)
            .with_concurrency_policy(self.config.concurrency_policy())
            .with_default_timeout(Duration::from_millis(self.config.default_timeout_ms))
            .with_retry_delay(Duration::from_millis(self.config.retry_delay_ms)))
    }
}
