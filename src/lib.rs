//! # Preflight
//!
//! An adaptive, priority-based resource-loading scheduler for application
//! start-up paths.
//!
//! Callers describe resources (url, priority class, kind, timeout/retry
//! budget) and submit them; the scheduler admits them under a bounded
//! concurrency cap in strict priority order (FIFO within a class),
//! deduplicates concurrent submits of the same url onto one shared attempt,
//! supervises each attempt with a deadline and a flat-delay retry policy,
//! and publishes change-suppressed stats snapshots to subscribers.
//!
//! ## Key pieces
//!
//! - **Scheduler**: priority queue + admission controller; sole owner of the
//!   queue, the dedup registry, and the stats snapshot.
//! - **Adapters**: one materialization primitive per resource kind behind
//!   [`core::ResourceAdapter`]; adding a kind means registering an adapter,
//!   nothing else. Platform adapters live with the embedder; an in-memory
//!   adapter ships for development and tests.
//! - **Supervisor**: races each attempt against a fresh full-length deadline
//!   and retries load/timeout failures with a flat 1000ms delay.
//! - **Preloader**: sequences critical/essential/non-critical groups for
//!   start-up and prefetches named routes.
//! - **PerformanceMonitor**: compares externally delivered timing values to
//!   static targets; purely observational.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use preflight::builders::SchedulerBuilder;
//! use preflight::config::LoaderConfig;
//! use preflight::core::{Priority, ResourceDescriptor, ResourceKind};
//! use preflight::infra::StaticAdapter;
//! use preflight::runtime::TokioSpawner;
//!
//! let scheduler = SchedulerBuilder::new(TokioSpawner::current())
//!     .with_config(LoaderConfig::default())
//!     .register_adapter(ResourceKind::Script, Arc::new(StaticAdapter::new()))
//!     .build()?;
//!
//! let handle = scheduler.submit(
//!     ResourceDescriptor::new("https://cdn.example/app.js", ResourceKind::Script)
//!         .with_priority(Priority::Critical)
//!         .with_timeout_ms(5_000)
//!         .with_max_retries(2),
//! );
//! handle.settled().await?;
//! ```
//!
//! For complete examples, see the integration tests under `tests/`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: descriptors, admission, dedup, supervision.
pub mod core;
/// Configuration models for the loader.
pub mod config;
/// Builders to construct loader components from configuration.
pub mod builders;
/// Infrastructure backends for the adapter capability set.
pub mod infra;
/// Start-up sequencing and route prefetch.
pub mod preload;
/// Observational performance monitoring.
pub mod perf;
/// Runtime adapters and the spawner seam.
pub mod runtime;
/// Shared utilities.
pub mod util;
