//! Infrastructure backends for the adapter capability set.

pub mod adapters;

pub use adapters::StaticAdapter;
