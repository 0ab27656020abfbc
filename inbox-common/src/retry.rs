use std::time;

/// The retry policy the notification worker uses to space out delivery
/// attempts for transient failures.
#[derive(Copy, Clone, Debug)]
pub struct RetryPolicy {
    /// Coefficient to multiply initial_interval with for every past attempt.
    backoff_coefficient: u32,
    /// The backoff interval for the first retry.
    initial_interval: time::Duration,
    /// The maximum possible backoff between retries.
    maximum_interval: Option<time::Duration>,
}

impl RetryPolicy {
    pub fn build(backoff_coefficient: u32, initial_interval: time::Duration) -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            backoff_coefficient,
            initial_interval,
            maximum_interval: None,
        }
    }

    /// Calculate the backoff to wait before retry attempt number `attempt`
    /// (zero-based: the interval between the first and the second attempt is
    /// `retry_interval(0, None)`).
    ///
    /// A `preferred_interval` (e.g. from a Retry-After response header) takes
    /// precedence over the exponential candidate but is still clamped by the
    /// configured maximum.
    pub fn retry_interval(
        &self,
        attempt: u32,
        preferred_interval: Option<time::Duration>,
    ) -> time::Duration {
        let candidate_interval = self.initial_interval * self.backoff_coefficient.pow(attempt);

        match (preferred_interval, self.maximum_interval) {
            (Some(preferred), Some(max_interval)) => std::cmp::min(
                std::cmp::max(std::cmp::min(candidate_interval, max_interval), preferred),
                max_interval,
            ),
            (Some(preferred), None) => std::cmp::max(candidate_interval, preferred),
            (None, Some(max_interval)) => std::cmp::min(candidate_interval, max_interval),
            (None, None) => candidate_interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff_coefficient: 2,
            initial_interval: time::Duration::from_secs(1),
            maximum_interval: None,
        }
    }
}

pub struct RetryPolicyBuilder {
    backoff_coefficient: u32,
    initial_interval: time::Duration,
    maximum_interval: Option<time::Duration>,
}

impl RetryPolicyBuilder {
    pub fn maximum_interval(mut self, interval: time::Duration) -> Self {
        self.maximum_interval = Some(interval);
        self
    }

    pub fn provide(&self) -> RetryPolicy {
        RetryPolicy {
            backoff_coefficient: self.backoff_coefficient,
            initial_interval: self.initial_interval,
            maximum_interval: self.maximum_interval,
        }
    }
}
