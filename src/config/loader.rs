//! Loader configuration structures.

use serde::{Deserialize, Serialize};

use crate::core::scheduler::ConcurrencyPolicy;

/// Admission caps applied from the host network-quality signal.
///
/// A fast link, or no signal at all, uses
/// [`LoaderConfig::max_concurrent_requests`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetworkPolicyConfig {
    /// Cap while the link is reported slow.
    pub slow_cap: usize,
    /// Cap while the link is reported moderate.
    pub moderate_cap: usize,
}

impl Default for NetworkPolicyConfig {
    fn default() -> Self {
        Self {
            slow_cap: 1,
            moderate_cap: 2,
        }
    }
}

/// Root loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Admission cap on a fast link.
    pub max_concurrent_requests: usize,
    /// Per-attempt deadline for descriptors that carry none, in milliseconds.
    pub default_timeout_ms: u64,
    /// Flat delay between retry attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Network-adaptive cap tiers.
    #[serde(default)]
    pub network: NetworkPolicyConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 6,
            default_timeout_ms: 10_000,
            retry_delay_ms: 1_000,
            network: NetworkPolicyConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// A message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be greater than 0".into());
        }
        if self.default_timeout_ms == 0 {
            return Err("default_timeout_ms must be greater than 0".into());
        }
        if self.network.slow_cap == 0 {
            return Err("network.slow_cap must be greater than 0".into());
        }
        if self.network.moderate_cap == 0 {
            return Err("network.moderate_cap must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse loader configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// A parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Concurrency policy derived from the configured caps.
    #[must_use]
    pub const fn concurrency_policy(&self) -> ConcurrencyPolicy {
        ConcurrencyPolicy {
            default_cap: self.max_concurrent_requests,
            slow_cap: self.network.slow_cap,
            moderate_cap: self.network.moderate_cap,
        }
    }
}
