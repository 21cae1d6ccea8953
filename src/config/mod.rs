//! Configuration models for the loader and its network-adaptive caps.

pub mod loader;

pub use loader::{LoaderConfig, NetworkPolicyConfig};
