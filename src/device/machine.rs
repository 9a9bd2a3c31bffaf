//! # Operating-mode state machine.
//!
//! [`StateMachine`] is the single writer of the current [`OperatingState`].
//! It renders nothing: the device asks it to move, then draws whatever the
//! new mode needs.
//!
//! ## Transition table
//! ```text
//! from ConfigMode | DeepSleep ──► Initializing only (restart / re-entry path)
//! to DeepSleep                ◄── Ready | ProductSelection | BtcTicker | Screensaver
//! to anything but Initializing while a restart is latched: rejected
//! anything else: accepted
//! ```
//!
//! ## Fault overlay
//! The machine tags at most one fault, the highest-priority broken domain.
//! The overlay is entered from idle modes only; elsewhere the tag waits for
//! the next redraw. A recovery leaves the overlay only when it is the tagged
//! fault that recovered.

use tracing::{info, warn};

use crate::clock::Millis;
use crate::events::{Bus, Event, EventKind};
use crate::network::{FaultKind, LinkState};

use super::state::OperatingState;

/// Effect of a health change on the fault overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultUpdate {
    /// The displayed fault did not change.
    Unchanged,
    /// This fault is now the one to display.
    Shown(FaultKind),
    /// The displayed fault recovered and nothing else is broken.
    Recovered,
}

pub struct StateMachine {
    current: OperatingState,
    previous: Option<OperatingState>,
    entered_at: Millis,
    fault: Option<FaultKind>,
    restart_latched: bool,
    bus: Bus,
}

impl StateMachine {
    pub fn new(bus: Bus, now: Millis) -> Self {
        Self {
            current: OperatingState::Initializing,
            previous: None,
            entered_at: now,
            fault: None,
            restart_latched: false,
            bus,
        }
    }

    pub fn current(&self) -> OperatingState {
        self.current
    }

    pub fn previous(&self) -> Option<OperatingState> {
        self.previous
    }

    pub fn entered_at(&self) -> Millis {
        self.entered_at
    }

    pub fn is_in_state(&self, state: OperatingState) -> bool {
        self.current == state
    }

    /// The fault the overlay shows (or will show on the next redraw).
    pub fn fault(&self) -> Option<FaultKind> {
        self.fault
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_latched
    }

    /// Moves to `target`. Returns `true` if the state changed.
    ///
    /// Moving to the current state does nothing. A move the table forbids is
    /// logged and published as rejected.
    pub fn transition(&mut self, target: OperatingState, now: Millis) -> bool {
        let from = self.current;
        if from == target {
            return false;
        }
        if !self.permits(from, target) {
            warn!(
                target: "switchcore::device",
                from = from.as_str(),
                to = target.as_str(),
                restart_pending = self.restart_latched,
                "transition rejected"
            );
            self.bus.publish(
                Event::new(EventKind::TransitionRejected, now)
                    .with_state(target)
                    .with_previous(from),
            );
            return false;
        }

        self.previous = Some(from);
        self.current = target;
        self.entered_at = now;
        if target == OperatingState::Initializing {
            // a fresh boot
            self.restart_latched = false;
        }
        info!(target: "switchcore::device", from = from.as_str(), to = target.as_str(), "state changed");
        self.bus.publish(
            Event::new(EventKind::StateChanged, now)
                .with_state(target)
                .with_previous(from),
        );
        true
    }

    fn permits(&self, from: OperatingState, to: OperatingState) -> bool {
        if to == OperatingState::Initializing {
            return true;
        }
        if self.restart_latched || from.is_terminal() {
            return false;
        }
        match to {
            OperatingState::DeepSleep => from.is_idle() || from == OperatingState::Screensaver,
            _ => true,
        }
    }

    /// Latches a restart. Returns `true` only for the first request; the
    /// caller then issues the platform restart.
    pub fn request_restart(&mut self, reason: &str, now: Millis) -> bool {
        if self.restart_latched {
            return false;
        }
        self.restart_latched = true;
        info!(target: "switchcore::device", reason, state = self.current.as_str(), "restart requested");
        self.bus
            .publish(Event::new(EventKind::RestartRequested, now).with_reason(reason));
        true
    }

    /// A fault domain broke. Tags it if it outranks the current tag and
    /// enters the overlay when the current mode allows it.
    pub fn raise_fault(&mut self, kind: FaultKind, now: Millis) -> FaultUpdate {
        if self.fault.is_some_and(|shown| !kind.outranks(shown)) {
            return FaultUpdate::Unchanged;
        }
        self.fault = Some(kind);
        if self.current.is_idle() || self.current == OperatingState::Initializing {
            self.transition(OperatingState::ErrorRecoverable, now);
        }
        FaultUpdate::Shown(kind)
    }

    /// A fault domain recovered. `remaining` is the highest domain still broken.
    pub fn resolve_fault(
        &mut self,
        kind: FaultKind,
        remaining: Option<FaultKind>,
        now: Millis,
    ) -> FaultUpdate {
        if self.fault != Some(kind) {
            return FaultUpdate::Unchanged;
        }
        if let Some(next) = remaining {
            self.fault = Some(next);
            return FaultUpdate::Shown(next);
        }
        self.fault = None;
        if self.current == OperatingState::ErrorRecoverable {
            self.transition(OperatingState::Ready, now);
        }
        FaultUpdate::Recovered
    }

    /// Folds a link status change into the overlay.
    pub fn update_wifi_state(
        &mut self,
        wifi: LinkState,
        remaining: Option<FaultKind>,
        now: Millis,
    ) -> FaultUpdate {
        match wifi {
            LinkState::Connected => self.resolve_fault(FaultKind::Link, remaining, now),
            LinkState::Connecting | LinkState::Disconnected => {
                self.raise_fault(FaultKind::Link, now)
            }
        }
    }
}
