//! Core scheduling abstractions: descriptors, admission, dedup, supervision.

pub mod adapter;
pub mod descriptor;
pub mod error;
pub mod scheduler;
pub mod stats;
pub mod supervisor;

pub use adapter::{AdapterSet, ResourceAdapter};
pub use descriptor::{
    CrossOrigin, LoadOptions, LoadState, Priority, ResourceDescriptor, ResourceKind,
};
pub use error::{AppResult, LoadError};
pub use scheduler::{
    BatchOutcome, ConcurrencyPolicy, LoadHandle, NetworkQuality, ResourceScheduler, Spawn,
};
pub use stats::{SchedulerStats, StatsHub, StatsSubscription};
pub use supervisor::{supervised_load, RetryPolicy, DEFAULT_LOAD_TIMEOUT, DEFAULT_RETRY_DELAY};
