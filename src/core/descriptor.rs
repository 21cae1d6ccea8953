//! Resource descriptors and per-url lifecycle state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Priority class governing queue admission order.
///
/// Totally ordered, highest first. Priority affects queue order only; it
/// never interrupts in-progress loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Must load before the application is usable.
    Critical,
    /// Needed early in the session.
    High,
    /// Default tier.
    Medium,
    /// Deferred until capacity is idle-ish.
    Low,
    /// Speculative route prefetch; lowest tier.
    Prefetch,
}

impl Priority {
    /// Rank for queue ordering, highest first.
    #[must_use]
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Prefetch => 0,
        }
    }
}

/// Capability tag selecting which adapter materializes a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Script-equivalent resource.
    Script,
    /// Stylesheet-equivalent resource.
    Style,
    /// Font-equivalent resource.
    Font,
    /// Image-equivalent resource.
    Image,
    /// Generic fetch-equivalent resource.
    Fetch,
}

impl ResourceKind {
    /// Stable wire name, used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Font => "font",
            Self::Image => "image",
            Self::Fetch => "fetch",
        }
    }
}

/// Cross-origin mode forwarded to adapters that understand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossOrigin {
    /// Anonymous credential mode.
    Anonymous,
    /// Send credentials with the request.
    UseCredentials,
}

/// Adapter-specific load options, passed through opaquely by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Cross-origin mode, where the adapter supports one.
    pub cross_origin: Option<CrossOrigin>,
    /// Free-form attributes an adapter may interpret.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Immutable value naming a resource, its priority class, kind, and
/// retry/timeout parameters. The url is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Resource url; unique deduplication key.
    pub url: String,
    /// Priority class for admission ordering.
    pub priority: Priority,
    /// Capability tag selecting the adapter.
    pub kind: ResourceKind,
    /// Per-attempt deadline in milliseconds; `None` uses the scheduler default.
    pub timeout_ms: Option<u64>,
    /// Additional attempts after the first failure.
    #[serde(default)]
    pub max_retries: u32,
    /// Adapter-specific options.
    #[serde(default)]
    pub options: LoadOptions,
}

impl ResourceDescriptor {
    /// Create a descriptor with `Medium` priority and no retries.
    pub fn new(url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            url: url.into(),
            priority: Priority::Medium,
            kind,
            timeout_ms: None,
            max_retries: 0,
            options: LoadOptions::default(),
        }
    }

    /// Set the priority class.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the per-attempt deadline in milliseconds.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the number of additional attempts after the first failure.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set adapter-specific options.
    #[must_use]
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }
}

/// Lifecycle state of a url as tracked by the scheduler.
///
/// `Loaded` is sticky; `Failed` is advisory and a fresh submit restarts the
/// full attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Never submitted.
    Unknown,
    /// Accepted and waiting for a concurrency slot.
    Queued,
    /// Dispatched to an adapter; attempt in flight.
    Loading,
    /// Settled successfully; re-submits resolve immediately.
    Loaded,
    /// Settled after exhausting retries; re-submits start over.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rank_total_order() {
        let ordered = [
            Priority::Prefetch,
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn descriptor_builder_defaults() {
        let d = ResourceDescriptor::new("https://cdn.example/app.js", ResourceKind::Script);
        assert_eq!(d.priority, Priority::Medium);
        assert_eq!(d.max_retries, 0);
        assert!(d.timeout_ms.is_none());
        assert!(d.options.cross_origin.is_none());
    }

    #[test]
    fn descriptor_roundtrips_through_json() {
        let d = ResourceDescriptor::new("https://cdn.example/brand.woff2", ResourceKind::Font)
            .with_priority(Priority::High)
            .with_timeout_ms(4_000)
            .with_max_retries(2);
        let json = serde_json::to_string(&d).unwrap();
        let back: ResourceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
