//! Builders to construct loader components from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::SchedulerBuilder;
