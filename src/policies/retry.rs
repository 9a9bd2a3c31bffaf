//! # Bounded retries spread over foreground ticks.
//!
//! [`RetryPolicy`] caps how many attempts a recovery round may make and how
//! long to wait between them. [`RetryRound`] is the per-domain progress of one
//! round: instead of sleeping between attempts, the owner asks on every tick
//! whether the next attempt is due.
//!
//! ```text
//! start(now) ──► poll(now) ─┬─ Wait                      (before next_attempt_at)
//!                           ├─ Attempt { attempt, delay } (issue one attempt)
//!                           └─ Exhausted                 (max_attempts used up)
//! ```

use crate::clock::Millis;
use crate::policies::backoff::BackoffPolicy;

/// How many attempts one recovery round makes, and how far apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per round (at least 1).
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Outcome of [`RetryRound::poll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryStep {
    /// The next attempt is not due yet.
    Wait,
    /// Issue attempt number `attempt` (1-based); the one after is due `delay_ms` later.
    Attempt { attempt: u32, delay_ms: Millis },
    /// Every attempt of the round has been issued and waited out.
    Exhausted,
}

/// Progress of one recovery round.
#[derive(Clone, Debug)]
pub struct RetryRound {
    policy: RetryPolicy,
    attempts: u32,
    next_attempt_at: Millis,
}

impl RetryRound {
    /// Starts a round whose first attempt is due immediately.
    pub fn start(policy: RetryPolicy, now: Millis) -> Self {
        Self {
            policy,
            attempts: 0,
            next_attempt_at: now,
        }
    }

    /// Attempts issued so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn next_attempt_at(&self) -> Millis {
        self.next_attempt_at
    }

    /// Advances the round if the next attempt is due.
    ///
    /// After the last attempt the round still waits one delay before reporting
    /// [`RetryStep::Exhausted`], giving that attempt time to land.
    pub fn poll(&mut self, now: Millis) -> RetryStep {
        if now < self.next_attempt_at {
            return RetryStep::Wait;
        }
        if self.attempts >= self.policy.max_attempts {
            return RetryStep::Exhausted;
        }
        let delay_ms = self.policy.backoff.next_ms(self.attempts);
        self.attempts += 1;
        self.next_attempt_at = now.saturating_add(delay_ms);
        RetryStep::Attempt {
            attempt: self.attempts,
            delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_every_two_seconds() -> RetryPolicy {
        RetryPolicy::new(5, BackoffPolicy::fixed_ms(2_000))
    }

    #[test]
    fn attempts_are_spaced_by_the_backoff() {
        let mut round = RetryRound::start(five_every_two_seconds(), 1_000);
        assert_eq!(
            round.poll(1_000),
            RetryStep::Attempt {
                attempt: 1,
                delay_ms: 2_000
            }
        );
        assert_eq!(round.poll(2_999), RetryStep::Wait);
        assert!(matches!(round.poll(3_000), RetryStep::Attempt { attempt: 2, .. }));
    }

    #[test]
    fn round_exhausts_after_max_attempts() {
        let mut round = RetryRound::start(five_every_two_seconds(), 0);
        let mut now = 0;
        for expected in 1..=5 {
            assert!(matches!(round.poll(now), RetryStep::Attempt { attempt, .. } if attempt == expected));
            now += 2_000;
        }
        assert_eq!(round.poll(now - 1), RetryStep::Wait);
        assert_eq!(round.poll(now), RetryStep::Exhausted);
        assert_eq!(round.attempts(), 5);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0, BackoffPolicy::fixed_ms(10));
        assert_eq!(policy.max_attempts, 1);
    }
}
