use crate::clock::{Millis, elapsed};

/// Electrical level of an input line. Inputs are active-low.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

impl Level {
    pub fn is_pressed(self) -> bool {
        matches!(self, Level::Low)
    }
}

/// Stable transition reported by [`Debouncer::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Turns a noisy raw level into stable edges.
///
/// A level becomes stable once it has stayed unchanged for `window_ms` since
/// the last raw edge. With a zero window every raw change is stable at once.
#[derive(Clone, Debug)]
pub struct Debouncer {
    window_ms: Millis,
    raw: Level,
    stable: Level,
    last_edge_ms: Millis,
}

impl Debouncer {
    /// Starts released.
    pub fn new(window_ms: Millis) -> Self {
        Self {
            window_ms,
            raw: Level::High,
            stable: Level::High,
            last_edge_ms: 0,
        }
    }

    pub fn raw(&self) -> Level {
        self.raw
    }

    pub fn stable(&self) -> Level {
        self.stable
    }

    pub fn last_edge_ms(&self) -> Millis {
        self.last_edge_ms
    }

    /// Feeds one raw sample.
    pub fn step(&mut self, raw: Level, now: Millis) -> Option<Edge> {
        if raw != self.raw {
            self.raw = raw;
            self.last_edge_ms = now;
        }
        if raw == self.stable || elapsed(now, self.last_edge_ms) < self.window_ms {
            return None;
        }
        self.stable = raw;
        Some(match raw {
            Level::Low => Edge::Pressed,
            Level::High => Edge::Released,
        })
    }
}
