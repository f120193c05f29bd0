//! Reconnect retry policy.

use std::time::Duration;

use crate::core::constants::{
    BACKOFF_MULTIPLIER, INITIAL_BACKOFF, MAX_BACKOFF, MAX_RECONNECT_ATTEMPTS,
};

/// Bounded exponential backoff for reconnect attempts.
///
/// A disconnect consumes one attempt; a successful connect refills the
/// budget. Once the budget is spent the session fails terminally and an
/// explicit restart is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before the session fails terminally.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Multiplier applied per consecutive failure.
    pub multiplier: u32,
    /// Ceiling on the backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
            multiplier: BACKOFF_MULTIPLIER,
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries: the first disconnect is terminal.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (zero-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        // Exponent capped well below overflow; the ceiling takes over long
        // before 2^20 anyway.
        let factor = self.multiplier.saturating_pow(attempt.min(20));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// True once `attempts` failures have spent the budget.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts > self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
            max_backoff: Duration::from_secs(8),
        };

        assert_eq!(policy.backoff_for(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(2000));
        // Capped at the ceiling.
        assert_eq!(policy.backoff_for(10), Duration::from_secs(8));
        assert_eq!(policy.backoff_for(u32::MAX), Duration::from_secs(8));
    }

    #[test]
    fn test_budget_exhaustion() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        assert!(!policy.is_exhausted(0));
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));

        assert!(RetryPolicy::none().is_exhausted(1));
    }
}
