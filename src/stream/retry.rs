//! Reconnection policy for the status stream.

use std::time::Duration;

/// Explicit retry policy so reconnection is configurable and testable with a
/// virtual clock. The production default matches the service contract: a
/// fixed 5 second delay, retried forever, no growth and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// `None` retries without bound.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before reconnection attempt number `attempt` (1-based), or
    /// `None` when the policy is exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt > max => None,
            _ => Some(self.delay),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(5000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fixed_five_seconds_unbounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay, Duration::from_millis(5000));
        assert_eq!(policy.max_attempts, None);
    }

    #[test]
    fn unbounded_policy_never_exhausts() {
        let policy = RetryPolicy::fixed(Duration::from_secs(5));
        for attempt in [1, 2, 1000] {
            assert_eq!(policy.next_delay(attempt), Some(Duration::from_secs(5)));
        }
    }

    #[test]
    fn delay_is_constant_across_attempts() {
        let policy = RetryPolicy::fixed(Duration::from_millis(200));
        assert_eq!(policy.next_delay(1), policy.next_delay(50));
    }

    #[test]
    fn capped_policy_exhausts_after_max() {
        let policy = RetryPolicy::fixed(Duration::from_secs(1)).with_max_attempts(3);
        assert!(policy.next_delay(3).is_some());
        assert_eq!(policy.next_delay(4), None);
    }
}
