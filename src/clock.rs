//! # Monotonic millisecond clock.
//!
//! Every timestamp in the crate is a [`Millis`] value counted from an origin
//! fixed at construction ("since boot"). Components never read the system
//! time directly; they receive `now` from the foreground loop, which takes it
//! from a [`Clock`].
//!
//! - [`MonotonicClock`] is backed by [`tokio::time::Instant`], so under
//!   `#[tokio::test(start_paused = true)]` it follows tokio's virtual time.
//! - [`ManualClock`] is advanced explicitly and shared by clone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;

/// Milliseconds since boot.
pub type Millis = u64;

/// Source of the current time in milliseconds since boot.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time.
    fn now_ms(&self) -> Millis;
}

/// Clock counting from the moment it was created.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    pub fn starting_at(start: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Jumps to an absolute time.
    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Moves time forward by `delta` and returns the new reading.
    pub fn advance(&self, delta: Millis) -> Millis {
        self.now.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Time elapsed since `since`, clamped at zero.
#[inline]
pub fn elapsed(now: Millis, since: Millis) -> Millis {
    now.saturating_sub(since)
}
