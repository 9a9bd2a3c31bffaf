//! # Observability events emitted by the device core.
//!
//! [`EventKind`] groups the events by component:
//! - **State machine**: mode changes, rejected transitions, restart requests
//! - **Input**: recognized actions, suppressed inputs
//! - **Power**: screensaver and sleep entry, wake
//! - **Network**: fault raise/clear, ping/pong, reconnect rounds
//! - **Fetch**: cycle start/finish, sub-fetch timeouts, stale results
//! - **Payment**: handled and rejected notifications
//! - **Subscribers**: dropped deliveries, handler panics
//!
//! [`Event`] carries the kind plus optional metadata filled in depending on it.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. `at_ms` is the device clock (milliseconds since boot) at
//! the moment the event was built.
//!
//! ## Example
//! ```rust
//! use switchcore::{Event, EventKind, FaultKind};
//!
//! let ev = Event::new(EventKind::FaultRaised, 12_000)
//!     .with_fault(FaultKind::Internet)
//!     .with_attempt(3);
//!
//! assert_eq!(ev.kind, EventKind::FaultRaised);
//! assert_eq!(ev.fault, Some(FaultKind::Internet));
//! assert_eq!(ev.at_ms, 12_000);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::clock::Millis;
use crate::device::OperatingState;
use crate::input::{Action, InputSource};
use crate::network::FaultKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of device events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === State machine ===
    /// The operating state changed.
    ///
    /// Sets:
    /// - `state`: new state
    /// - `previous`: state left
    StateChanged,

    /// A transition was refused by the transition table or the restart latch.
    ///
    /// Sets:
    /// - `state`: requested target
    /// - `previous`: current state (unchanged)
    TransitionRejected,

    /// A restart was issued to the platform (latched, at most once).
    ///
    /// Sets:
    /// - `reason`: why
    RestartRequested,

    // === Input ===
    /// A recognizer dispatched an action that the device acted on.
    ///
    /// Sets:
    /// - `source`: input
    /// - `action`: recognized action
    InputAction,

    /// An input was dropped (wake grace, or it only woke the device).
    ///
    /// Sets:
    /// - `source`: input (absent for navigation)
    /// - `reason`: `"grace"` or `"wake"`
    InputSuppressed,

    // === Power ===
    /// The screensaver blanked the display.
    ///
    /// Sets:
    /// - `reason`: screensaver mode
    ScreensaverActivated,

    /// The screensaver was dismissed.
    ScreensaverDismissed,

    /// The device is about to hand control to the platform sleep call.
    ///
    /// Sets:
    /// - `reason`: sleep mode
    SleepEntered,

    /// Freeze entry was aborted because a wake button was already asserted.
    SleepAborted,

    /// Execution resumed after a light sleep or a freeze.
    Woke,

    // === Network ===
    /// A fault domain became broken.
    ///
    /// Sets:
    /// - `fault`: domain
    /// - `attempt`: the domain's error counter after the increment
    FaultRaised,

    /// A broken fault domain recovered.
    ///
    /// Sets:
    /// - `fault`: domain
    FaultCleared,

    /// A liveness ping was sent on the socket.
    PingSent,

    /// No pong arrived in time; the socket was forced down.
    ///
    /// Sets:
    /// - `delay_ms`: time since the ping
    PongMissed,

    /// One socket reconnect attempt was issued.
    ///
    /// Sets:
    /// - `attempt`: attempt number within the round (1-based)
    /// - `delay_ms`: wait before the next attempt
    ReconnectScheduled,

    /// A reconnect round used up its attempts.
    ///
    /// Sets:
    /// - `attempt`: attempts made
    ReconnectExhausted,

    // === Fetch ===
    /// A fetch cycle started.
    ///
    /// Sets:
    /// - `generation`: cycle generation
    /// - `reason`: `"forced"` after link recovery or a label refresh
    FetchStarted,

    /// A fetch cycle published its snapshot.
    ///
    /// Sets:
    /// - `generation`: cycle generation
    /// - `reason`: which values are available
    FetchCompleted,

    /// A sub-fetch did not answer within its budget or failed.
    ///
    /// Sets:
    /// - `generation`: cycle generation, absent for a label fetch
    /// - `reason`: sub-fetch name and error label
    SubFetchFailed,

    /// The product labels were fetched.
    ///
    /// Sets:
    /// - `reason`: label count
    LabelsUpdated,

    /// A result from an abandoned generation arrived and was dropped.
    ///
    /// Sets:
    /// - `generation`: generation the result belonged to
    StaleResultDiscarded,

    // === Payment ===
    /// A payment actuated a switch.
    ///
    /// Sets:
    /// - `pin`: switch output
    /// - `delay_ms`: actuation duration
    /// - `reason`: special mode name when the output was pulsed
    PaymentHandled,

    /// A payment notification was dropped.
    ///
    /// Sets:
    /// - `reason`: error label and message
    PaymentRejected,

    // === Subscribers ===
    /// A subscriber's queue was full or closed; the event was dropped for it.
    ///
    /// Sets:
    /// - `reason`: `"<subscriber>: full"` or `"<subscriber>: closed"`
    SubscriberOverflow,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets:
    /// - `reason`: `"<subscriber>: <panic message>"`
    SubscriberPanicked,
}

/// Device event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Device clock when the event was built.
    pub at_ms: Millis,
    /// Event classification.
    pub kind: EventKind,

    pub state: Option<OperatingState>,
    pub previous: Option<OperatingState>,
    pub fault: Option<FaultKind>,
    pub source: Option<InputSource>,
    pub action: Option<Action>,
    /// Attempt number or counter value.
    pub attempt: Option<u32>,
    pub delay_ms: Option<Millis>,
    /// Fetch cycle generation.
    pub generation: Option<u64>,
    /// Switch output.
    pub pin: Option<u8>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind stamped `at_ms`, with the next sequence number.
    pub fn new(kind: EventKind, at_ms: Millis) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at_ms,
            kind,
            state: None,
            previous: None,
            fault: None,
            source: None,
            action: None,
            attempt: None,
            delay_ms: None,
            generation: None,
            pin: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_state(mut self, state: OperatingState) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn with_previous(mut self, previous: OperatingState) -> Self {
        self.previous = Some(previous);
        self
    }

    #[inline]
    pub fn with_fault(mut self, fault: FaultKind) -> Self {
        self.fault = Some(fault);
        self
    }

    #[inline]
    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = Some(source);
        self
    }

    #[inline]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_delay_ms(mut self, ms: Millis) -> Self {
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    #[inline]
    pub fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether this event reports a connectivity fault change.
    #[inline]
    pub fn is_fault_change(&self) -> bool {
        matches!(self.kind, EventKind::FaultRaised | EventKind::FaultCleared)
    }
}
