//! Timeout and retry supervision around a single adapter invocation.

use std::time::Duration;

use crate::core::adapter::ResourceAdapter;
use crate::core::descriptor::ResourceDescriptor;
use crate::core::error::LoadError;

/// Fixed delay between attempts. The reference policy uses a flat delay with
/// no backoff growth; deviating breaks the retry-exhaustion timing contract.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Default per-attempt deadline applied when a descriptor carries none.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Bounded retry policy for one supervised load.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Flat delay between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Run one adapter load under a deadline with bounded retries.
///
/// Each attempt races the adapter against a fresh full-length deadline;
/// whichever settles first wins and the loser is dropped, so a late adapter
/// settlement is unobservable. A deadline firing yields
/// [`LoadError::Timeout`], treated identically to an adapter failure for
/// retry accounting. A persistently failing adapter is invoked exactly
/// `max_retries + 1` times.
pub async fn supervised_load(
    adapter: &dyn ResourceAdapter,
    descriptor: &ResourceDescriptor,
    deadline: Duration,
    policy: RetryPolicy,
) -> Result<(), LoadError> {
    let url = descriptor.url.as_str();
    let mut attempt: u32 = 0;
    loop {
        let outcome = match tokio::time::timeout(
            deadline,
            adapter.load(url, &descriptor.options),
        )
        .await
        {
            Ok(settled) => settled,
            Err(_) => Err(LoadError::Timeout {
                url: url.to_owned(),
                timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match outcome {
            Ok(()) => {
                if attempt > 0 {
                    tracing::info!(url, attempt, "load succeeded after retry");
                }
                return Ok(());
            }
            Err(err @ LoadError::UnsupportedType { .. }) => return Err(err),
            Err(err) => {
                if attempt >= policy.max_retries {
                    tracing::warn!(url, attempts = attempt + 1, error = %err, "retries exhausted");
                    return Err(err);
                }
                attempt += 1;
                tracing::warn!(url, attempt, error = %err, "load attempt failed, retrying");
                tokio::time::sleep(policy.retry_delay).await;
            }
        }
    }
}
