//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use crate::core::Spawn;

/// Tokio-based spawner that executes dispatch tasks on a tokio runtime.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
    /// Keeps a self-built runtime alive for the spawner's lifetime.
    #[allow(dead_code)]
    owned: Option<Arc<tokio::runtime::Runtime>>,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
            owned: None,
        }
    }

    /// Create a spawner on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime context.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    /// Create a spawner owning a new multi-threaded runtime.
    ///
    /// # Errors
    ///
    /// Propagates runtime construction failure.
    pub fn with_worker_threads(worker_threads: usize) -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .enable_all()
            .build()?;
        Ok(Self {
            handle: Arc::new(runtime.handle().clone()),
            owned: Some(Arc::new(runtime)),
        })
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
