//! # Delay between retries.
//!
//! [`BackoffPolicy`] turns an attempt number into a delay:
//! `first × factor^attempt`, clamped to `max`, then jittered. The device uses
//! `factor = 1.0` everywhere (socket reconnect every 2s, fetch retry gate
//! every 30s), but the curve is kept general so a deployment can stretch it.
//!
//! The base delay depends only on the attempt number, so jitter never feeds
//! back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use switchcore::{BackoffPolicy, JitterPolicy};
//!
//! let reconnect = BackoffPolicy::fixed(Duration::from_secs(2));
//! assert_eq!(reconnect.next(0), Duration::from_secs(2));
//! assert_eq!(reconnect.next(4), Duration::from_secs(2));
//!
//! let growing = BackoffPolicy {
//!     first: Duration::from_millis(500),
//!     max: Duration::from_secs(4),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//! assert_eq!(growing.next(1), Duration::from_secs(1));
//! assert_eq!(growing.next(5), Duration::from_secs(4));
//! ```

use std::time::Duration;

use crate::clock::Millis;
use crate::policies::jitter::JitterPolicy;

/// Retry delay curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound of any delay.
    pub max: Duration,
    /// Multiplicative growth per attempt (`1.0` = fixed delay).
    pub factor: f64,
    /// Randomization applied after clamping.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Fixed 2s delay, no jitter.
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

impl BackoffPolicy {
    /// Constant delay without jitter.
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Constant delay given in milliseconds.
    pub const fn fixed_ms(delay_ms: Millis) -> Self {
        Self::fixed(Duration::from_millis(delay_ms))
    }

    /// Same curve with a different jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay for the given attempt number (0-indexed).
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped)
        };
        self.jitter.apply(base)
    }

    /// [`next`](Self::next) in milliseconds, for comparing against clock readings.
    pub fn next_ms(&self, attempt: u32) -> Millis {
        self.next(attempt).as_millis() as Millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_is_constant() {
        let policy = BackoffPolicy::fixed_ms(2_000);
        for attempt in 0..10 {
            assert_eq!(policy.next_ms(attempt), 2_000, "attempt {attempt}");
        }
    }

    #[test]
    fn exponential_growth_is_capped() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(2), Duration::from_millis(400));
        assert_eq!(policy.next(10), Duration::from_secs(1));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn first_above_max_clamps() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 1.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn equal_jitter_stays_in_upper_half() {
        let policy = BackoffPolicy::fixed_ms(30_000).with_jitter(JitterPolicy::Equal);
        for attempt in 0..50 {
            let delay = policy.next_ms(attempt);
            assert!((15_000..=30_000).contains(&delay), "delay {delay}");
        }
    }
}
