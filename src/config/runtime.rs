//! # Runtime configuration.
//!
//! [`RuntimeConfig`] holds the settings of the host loop rather than of the
//! device: how often the foreground tick runs and how large the event bus is.

use std::time::Duration;

/// Settings for [`Device::run`](crate::Device::run) and the event bus.
///
/// ## Field semantics
/// - `tick_period`: distance between two foreground ticks (`0` is clamped to 1ms)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Period of the foreground loop.
    ///
    /// Input sampling happens once per tick, so this must stay well below the
    /// button debounce window.
    pub tick_period: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl RuntimeConfig {
    /// Returns the tick period, never zero.
    #[inline]
    pub fn tick_period_clamped(&self) -> Duration {
        self.tick_period.max(Duration::from_millis(1))
    }

    /// Returns bus capacity clamped to at least 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RuntimeConfig {
    /// Returns a configuration with:
    /// - `tick_period = 10ms`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(10),
            bus_capacity: 1024,
        }
    }
}
