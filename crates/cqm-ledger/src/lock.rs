//! Advisory-lock retry policy.
//!
//! The lock is a conditional insert of a distinguished ledger row; because
//! the store is eventually consistent it is advisory, not a strong mutex.
//! Contenders poll with exponential backoff up to a bounded attempt count.

use std::time::Duration;

/// Backoff schedule for lock acquisition.
#[derive(Debug, Clone)]
pub struct LockPolicy {
    /// Attempts before giving up with `LockUnavailable`.
    pub max_attempts: u32,

    /// Delay after the first losing attempt.
    pub base_delay: Duration,

    /// Upper bound on the per-attempt delay.
    pub max_delay: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(3),
        }
    }
}

impl LockPolicy {
    /// Delay to sleep after losing `attempt` (0-based): doubling from the
    /// base, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = LockPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(10), Duration::from_secs(3));
        // Large attempt counts must not overflow
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(3));
    }
}
