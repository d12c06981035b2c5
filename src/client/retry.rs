use std::time::Duration;

use backon::ConstantBuilder;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

/// Bounded retry policy for transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay used when the service gives no hint.
    pub delay: Duration,
    /// Upper bound on any single wait, hinted or not.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            max_delay: DEFAULT_MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            max_delay,
        }
    }

    /// Fixed-delay backoff yielding `max_retries` waits.
    #[must_use]
    pub fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay.min(self.max_delay))
            .with_max_times(self.max_retries as usize)
    }

    /// Replaces a scheduled wait with the service's hint, capped at
    /// `max_delay`. `None` means the retries are used up and stays `None`.
    pub fn adjust(&self, hint: Option<Duration>, scheduled: Option<Duration>) -> Option<Duration> {
        scheduled.map(|delay| hint.map_or(delay, |hint| hint.min(self.max_delay)))
    }
}
