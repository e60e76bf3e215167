//! Bounded polling with exponential backoff
//!
//! Used where the platform is eventually consistent and a re-read has to
//! wait for an earlier write to show up.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Backoff schedule and hard deadline for [`poll_until`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second read
    pub initial_delay: Duration,
    /// Cap for exponential growth
    pub max_delay: Duration,
    /// Growth factor between attempts
    pub multiplier: f64,
    /// Give up once this much time has passed
    pub timeout: Duration,
}

impl PollPolicy {
    /// 1s, 2s, 4s, 8s, 8s... for up to a minute
    pub const DEFAULT: Self = Self {
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(8),
        multiplier: 2.0,
        timeout: Duration::from_secs(60),
    };

    /// Delay after the given attempt (0-indexed), capped at `max_delay`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Re-run `read` until `done` accepts its value or the deadline passes.
///
/// Read errors abort immediately. Exhausting the deadline is a
/// [`Error::MergeFailed`] naming `what`.
pub async fn poll_until<T, F, Fut, P>(
    policy: &PollPolicy,
    what: &str,
    mut read: F,
    done: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 0;

    loop {
        let value = read().await?;
        if done(&value) {
            debug!(what, attempts = attempt + 1, "poll condition met");
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::MergeFailed(format!(
                "timed out after {:?} waiting for {what}",
                policy.timeout
            )));
        }

        let delay = policy.delay_for_attempt(attempt).min(deadline - now);
        debug!(what, attempt, ?delay, "poll condition not met, backing off");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
