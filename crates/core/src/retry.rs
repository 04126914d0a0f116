use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

/// How transient model failures are retried.
///
/// Delays grow exponentially from `initial_interval` up to `max_interval`,
/// and retrying stops once `max_elapsed_time` has passed since the first
/// attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Upper bound of a single delay.
    pub max_interval: Duration,
    /// Total time budget for one request, retries included.
    pub max_elapsed_time: Duration,
}

impl RetryPolicy {
    /// Creates the default policy with a different time budget.
    #[inline]
    pub fn with_max_elapsed_time(max_elapsed_time: Duration) -> Self {
        Self {
            max_elapsed_time,
            ..Default::default()
        }
    }

    pub(crate) fn to_backoff(self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(Some(self.max_elapsed_time))
            .build()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
            max_elapsed_time: Duration::from_secs(30),
        }
    }
}
