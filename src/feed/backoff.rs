//! Reconnect backoff policy

use std::time::Duration;

/// Bounded exponential backoff for automatic reconnects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Automatic retries allowed before waiting for a manual reconnect
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retrying after `attempts` failed retries:
    /// `min(base * 2^attempts, max)`.
    pub fn delay(&self, attempts: u32) -> Duration {
        let factor = 2u32.checked_pow(attempts).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another automatic retry is allowed
    pub fn can_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u128> = (0..5).map(|a| policy.delay(a).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
    }

    #[test]
    fn test_delay_capped() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(5), Duration::from_millis(30_000));
        assert_eq!(policy.delay(40), Duration::from_millis(30_000));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn test_can_retry() {
        let policy = ReconnectPolicy::default();
        assert!(policy.can_retry(0));
        assert!(policy.can_retry(4));
        assert!(!policy.can_retry(5));
    }
}
