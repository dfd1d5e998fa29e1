//! Exponential backoff shared by every delivery path.

use std::time::Duration;

use codeferry_config::RetryConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Bound on the whole delivery, retries and waits included.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            deadline: config.deadline_ms.map(Duration::from_millis),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based): `base_delay * 2^attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_two_then_four_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert!(policy.deadline.is_none());
    }

    #[test]
    fn stops_at_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn large_attempt_numbers_saturate() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_after(64) >= policy.delay_after(31));
    }

    #[test]
    fn reads_config() {
        let config = RetryConfig { max_attempts: 0, base_delay_ms: 50, deadline_ms: Some(900) };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.deadline, Some(Duration::from_millis(900)));
    }
}
