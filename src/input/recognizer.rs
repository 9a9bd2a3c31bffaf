//! # Click and hold recognition for one physical input.
//!
//! [`ClickRecognizer`] is a pure step function: the foreground loop samples
//! the raw level once per tick and calls [`ClickRecognizer::step`]. Nothing
//! here reads a clock or a pin.
//!
//! ## Sequence handling
//! ```text
//! raw ─► Debouncer ─► stable press ──► bounce? (< min gap since release) ─► ignored
//!                          │
//!                          ├─► count click (new sequence if outside window)
//!                          ├─► Trigger::Click rule?  ─► Action (immediate)
//!                          └─► InputEvent::Pressed
//!        while pressed     ─► Trigger::Hold rule?    ─► Action, sequence cleared
//!        while released    ─► quiet > window?        ─► Trigger::Timeout rule ─► Action
//! ```
//!
//! Every dispatched action clears the click count and sequence start.

use tracing::{debug, trace};

use crate::clock::{Millis, elapsed};
use crate::config::InputTimings;

use super::debounce::{Debouncer, Edge, Level};
use super::table::{Action, ActionTable, InputSource};

/// What a recognizer step produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// A counted press just became stable.
    Pressed,
    /// A complete gesture was recognized.
    Action(Action),
}

/// Snapshot of one recognizer's sequence state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickSequenceState {
    pub raw_level: Level,
    pub stable_level: Level,
    pub last_edge_ms: Millis,
    pub press_start_ms: Option<Millis>,
    pub click_count: u8,
    pub sequence_start_ms: Option<Millis>,
    pub hold_fired: bool,
}

/// Debounced multi-click and hold recognizer.
#[derive(Clone, Debug)]
pub struct ClickRecognizer {
    source: InputSource,
    timings: InputTimings,
    table: ActionTable,
    debouncer: Debouncer,

    press_start_ms: Option<Millis>,
    click_count: u8,
    sequence_start_ms: Option<Millis>,
    hold_fired: bool,

    last_release_ms: Option<Millis>,
    /// The current press was bounce, woke the device, or already fired.
    ignore_press: bool,
}

impl ClickRecognizer {
    /// Creates a recognizer with the debounce window matching `source`.
    pub fn new(source: InputSource, timings: InputTimings, table: ActionTable) -> Self {
        let window = match source {
            InputSource::Button => timings.button_debounce_ms,
            InputSource::Touch => timings.touch_debounce_ms,
        };
        Self {
            source,
            timings,
            table,
            debouncer: Debouncer::new(window),
            press_start_ms: None,
            click_count: 0,
            sequence_start_ms: None,
            hold_fired: false,
            last_release_ms: None,
            ignore_press: false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.debouncer.stable().is_pressed()
    }

    pub fn state(&self) -> ClickSequenceState {
        ClickSequenceState {
            raw_level: self.debouncer.raw(),
            stable_level: self.debouncer.stable(),
            last_edge_ms: self.debouncer.last_edge_ms(),
            press_start_ms: self.press_start_ms,
            click_count: self.click_count,
            sequence_start_ms: self.sequence_start_ms,
            hold_fired: self.hold_fired,
        }
    }

    /// Feeds one raw sample taken at `now`.
    pub fn step(&mut self, raw: Level, now: Millis) -> Option<InputEvent> {
        match self.debouncer.step(raw, now) {
            Some(Edge::Pressed) => self.on_press(now),
            Some(Edge::Released) => {
                self.on_release(now);
                None
            }
            None if self.is_pressed() => self.check_hold(now),
            None => self.check_timeout(now),
        }
    }

    /// Drops the sequence in progress, including the press currently held.
    pub fn cancel_sequence(&mut self) {
        self.reset_sequence();
        if self.is_pressed() {
            self.ignore_press = true;
        }
    }

    fn on_press(&mut self, now: Millis) -> Option<InputEvent> {
        if let Some(released) = self.last_release_ms {
            if elapsed(now, released) < self.timings.min_click_gap_ms {
                trace!(target: "switchcore::input", source = self.source.as_str(), "bounce ignored");
                self.ignore_press = true;
                return None;
            }
        }
        self.ignore_press = false;
        self.hold_fired = false;
        self.press_start_ms = Some(now);

        let in_window = self
            .last_release_ms
            .is_some_and(|released| elapsed(now, released) <= self.timings.sequence_window_ms);
        if self.click_count == 0 || !in_window {
            self.click_count = 0;
            self.sequence_start_ms = Some(now);
        }
        self.click_count = self.click_count.saturating_add(1);
        trace!(target: "switchcore::input", source = self.source.as_str(), clicks = self.click_count, "press");

        if let Some(action) = self.table.on_click(self.source, self.click_count) {
            self.ignore_press = true;
            return Some(self.dispatch(action));
        }
        Some(InputEvent::Pressed)
    }

    fn on_release(&mut self, now: Millis) {
        self.last_release_ms = Some(now);
        self.press_start_ms = None;
        self.hold_fired = false;
        self.ignore_press = false;
    }

    fn check_hold(&mut self, now: Millis) -> Option<InputEvent> {
        let start = self.press_start_ms?;
        if self.hold_fired || self.ignore_press {
            return None;
        }
        let held = elapsed(now, start);
        let action = self
            .table
            .on_hold(self.source, self.click_count, held, &self.timings)?;
        self.hold_fired = true;
        Some(self.dispatch(action))
    }

    fn check_timeout(&mut self, now: Millis) -> Option<InputEvent> {
        if self.click_count == 0 {
            return None;
        }
        let released = self.last_release_ms?;
        if elapsed(now, released) <= self.timings.sequence_window_ms {
            return None;
        }
        let clicks = self.click_count;
        match self.table.on_timeout(self.source, clicks) {
            Some(action) => Some(self.dispatch(action)),
            None => {
                self.reset_sequence();
                None
            }
        }
    }

    fn dispatch(&mut self, action: Action) -> InputEvent {
        debug!(
            target: "switchcore::input",
            source = self.source.as_str(),
            clicks = self.click_count,
            hold = self.hold_fired,
            action = action.as_str(),
            "action recognized"
        );
        self.reset_sequence();
        InputEvent::Action(action)
    }

    fn reset_sequence(&mut self) {
        self.click_count = 0;
        self.sequence_start_ms = None;
    }
}
