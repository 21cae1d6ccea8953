//! Runtime adapters bridging the spawner seam to concrete executors.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
