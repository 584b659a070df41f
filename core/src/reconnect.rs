// Reconnection policy: linear backoff with an attempt cap

use std::time::Duration;

/// Decides whether and when a dropped stream connection is re-established.
///
/// Delays grow linearly with the attempt number (base × attempt). Once the
/// cap is reached no further reconnect is scheduled; the session degrades to
/// polling until an explicit new connect resets the policy.
#[derive(Debug)]
pub struct ReconnectPolicy {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Called after a failed/closed connection. Returns the delay before the
    /// next attempt, or `None` once the cap is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.base_delay * self.attempts)
    }

    /// Called on every successful open, at any attempt count.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_linearly() {
        let mut policy = ReconnectPolicy::new(Duration::from_secs(3), 5);
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(3)));
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(6)));
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(9)));
        assert_eq!(policy.attempts(), 3);
    }

    #[test]
    fn stops_at_cap_and_stays_pinned() {
        let mut policy = ReconnectPolicy::new(Duration::from_millis(100), 2);
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert_eq!(policy.next_delay(), None);
        assert_eq!(policy.next_delay(), None);
        assert_eq!(policy.attempts(), 2);
        assert!(policy.exhausted());
    }

    #[test]
    fn reset_clears_any_attempt_count() {
        let mut policy = ReconnectPolicy::new(Duration::from_secs(1), 5);
        for _ in 0..5 {
            policy.next_delay();
        }
        assert!(policy.exhausted());
        policy.reset();
        assert_eq!(policy.attempts(), 0);
        assert!(!policy.exhausted());
        assert_eq!(policy.next_delay(), Some(Duration::from_secs(1)));
    }
}
