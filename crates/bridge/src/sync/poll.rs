//! Poll-with-backoff for asynchronous remote processing.

use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Total number of probes, including the first.
    pub max_attempts: u32,
    /// Delay after the first unsuccessful probe.
    pub initial_interval: Duration,
    /// Delay cap.
    pub max_interval: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            multiplier: 2,
        }
    }
}

impl Backoff {
    /// A schedule that waits the same interval between every probe.
    #[must_use]
    pub const fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1,
        }
    }

    /// Delay after the given probe (1-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.max(1).saturating_pow(attempt - 1);
        self.initial_interval
            .saturating_mul(factor)
            .min(self.max_interval)
    }
}

/// What one probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T> {
    /// Processing finished successfully.
    Ready(T),
    /// Processing finished unsuccessfully; polling stops.
    Failed,
    /// Not finished yet (or the probe itself failed).
    Pending,
}

/// Terminal state of a poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    Failed,
    /// Every attempt came back pending.
    Exhausted,
}

/// Probe until ready, failed, or out of attempts.
///
/// The first probe runs immediately. Between pending probes the loop sleeps
/// on the `tokio` clock, so tests can drive it with a paused runtime. The
/// probe receives the 1-based attempt number.
pub async fn poll_until<T, F, Fut>(backoff: &Backoff, mut probe: F) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Readiness<T>>,
{
    for attempt in 1..=backoff.max_attempts {
        match probe(attempt).await {
            Readiness::Ready(value) => return PollOutcome::Ready(value),
            Readiness::Failed => return PollOutcome::Failed,
            Readiness::Pending => {
                if attempt < backoff.max_attempts {
                    tokio::time::sleep(backoff.delay_for_attempt(attempt)).await;
                }
            }
        }
    }
    PollOutcome::Exhausted
}
