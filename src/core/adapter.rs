//! Adapter capability set: one materialization primitive per resource kind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::descriptor::{LoadOptions, ResourceKind};
use crate::core::error::LoadError;

/// Materializes one kind of resource.
///
/// `load` settles when the resource is usable. Implementations are
/// cancellation-agnostic; deadline enforcement (dropping a late attempt)
/// belongs entirely to the supervisor.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Load the resource at `url`, settling when it is usable.
    async fn load(&self, url: &str, options: &LoadOptions) -> Result<(), LoadError>;
}

/// Registry mapping a [`ResourceKind`] to the adapter servicing it.
///
/// The scheduler is agnostic to which adapter backs a kind; supporting a new
/// resource kind means registering a new adapter, nothing else.
#[derive(Default, Clone)]
pub struct AdapterSet {
    adapters: HashMap<ResourceKind, Arc<dyn ResourceAdapter>>,
}

impl AdapterSet {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` for `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: ResourceKind, adapter: Arc<dyn ResourceAdapter>) {
        self.adapters.insert(kind, adapter);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_adapter(mut self, kind: ResourceKind, adapter: Arc<dyn ResourceAdapter>) -> Self {
        self.register(kind, adapter);
        self
    }

    /// Adapter registered for `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<Arc<dyn ResourceAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// Whether an adapter is registered for `kind`.
    #[must_use]
    pub fn supports(&self, kind: ResourceKind) -> bool {
        self.adapters.contains_key(&kind)
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.adapters.keys().map(|k| k.as_str()).collect();
        f.debug_struct("AdapterSet").field("kinds", &kinds).finish()
    }
}
