//! Bounded retry with a pluggable backoff strategy.
//!
//! Network calls go through [`with_retry`], which re-runs an operation while
//! it fails with a transient error (see [`CuratorError::is_transient`]) and
//! returns the last error once the attempts are exhausted. The wait between
//! attempts comes from a [`Backoff`] so tests can retry without sleeping.

use crate::error::{CuratorError, Result};
use rand::{Rng, rng};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// Decides how long to wait before the next attempt.
pub trait Backoff: fmt::Debug + Send + Sync {
    /// Delay before retry number `attempt` (1-based, counting failures so far).
    fn delay(&self, attempt: usize) -> Duration;
}

/// A fixed pause plus up to `max_jitter` of random slack.
#[derive(Debug, Clone)]
pub struct FixedBackoff {
    pub delay: Duration,
    pub max_jitter: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_jitter: Duration::from_millis(250),
        }
    }
}

impl Backoff for FixedBackoff {
    fn delay(&self, _attempt: usize) -> Duration {
        let jitter_cap = self.max_jitter.as_millis() as u64;
        let jitter_ms: u64 = if jitter_cap == 0 {
            0
        } else {
            rng().random_range(0..=jitter_cap)
        };
        self.delay + Duration::from_millis(jitter_ms)
    }
}

/// Retry immediately.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

#[cfg(test)]
impl Backoff for NoBackoff {
    fn delay(&self, _attempt: usize) -> Duration {
        Duration::ZERO
    }
}

/// Run `op` up to `max_attempts` times.
///
/// Non-transient errors are returned straight away; transient ones are
/// retried after `backoff.delay(attempt)`. `what` only labels the log lines.
pub async fn with_retry<T, F, Fut>(
    what: &str,
    max_attempts: usize,
    backoff: &dyn Backoff,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let total_t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                let elapsed_ms_total = total_t0.elapsed().as_millis();

                if !e.is_transient() || attempt >= max_attempts {
                    error!(
                        what,
                        attempt,
                        max = max_attempts,
                        elapsed_ms_total,
                        error = %e,
                        "giving up"
                    );
                    return Err(e);
                }

                let delay = backoff.delay(attempt);
                warn!(
                    what,
                    attempt,
                    max = max_attempts,
                    elapsed_ms_total,
                    ?delay,
                    error = %e,
                    "attempt failed; backing off"
                );
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Error for a non-2xx response; treated as transient.
pub fn status_error(url: &str, status: u16) -> CuratorError {
    CuratorError::HttpStatus {
        url: url.to_string(),
        status,
    }
}
