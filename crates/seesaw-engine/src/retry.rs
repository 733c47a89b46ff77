//! Retry with exponential backoff for read-only gateway calls.
//!
//! Only queries go through here. Order placement is never retried: a
//! placement that timed out may still have reached the exchange.

use std::future::Future;
use std::time::Duration;

use seesaw_core::config::EngineSettings;
use seesaw_core::error::GatewayError;
use tracing::warn;

use crate::clock::Clock;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How many times to retry a transient failure, and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub retries: u32,
    /// Wait before the first retry; doubles each time, capped at 30s.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            retries: settings.query_retries,
            backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    /// Wait before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// A rate-limit response with a `Retry-After` hint waits for at least that
/// long.
pub async fn retry_query<C, F, Fut, T>(
    policy: &RetryPolicy,
    clock: &C,
    what: &str,
    mut op: F,
) -> Result<T, GatewayError>
where
    C: Clock + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < policy.retries => {
                let mut wait = policy.delay(attempt);
                if let GatewayError::RateLimited {
                    retry_after: Some(hint),
                } = &e
                {
                    wait = wait.max(*hint);
                }
                attempt += 1;
                warn!(
                    "{what} failed ({e}); retry {attempt}/{} in {wait:?}",
                    policy.retries
                );
                clock.sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}
