//! # Logging subscriber.
//!
//! [`LogWriter`] writes every [`Event`] through `tracing`, one line per event,
//! under the `switchcore::events` target. Warnings for faults, rejections and
//! delivery problems; info for state and power changes; debug for the rest.
//!
//! ## Output (fmt subscriber)
//! ```text
//! INFO  switchcore::events: state-changed seq=4 at_ms=12 from=initializing to=ready
//! WARN  switchcore::events: fault-raised seq=9 at_ms=5000 fault=link count=1
//! DEBUG switchcore::events: reconnect seq=15 at_ms=7000 attempt=2 delay_ms=2000
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Structured logging subscriber.
///
/// Enabled via the `logging` feature.
pub struct LogWriter;

impl LogWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn state(s: Option<crate::device::OperatingState>) -> &'static str {
    s.map(|s| s.as_str()).unwrap_or("-")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        const T: &str = "switchcore::events";
        let reason = e.reason.as_deref().unwrap_or("");
        let fault = e.fault.map(|f| f.as_str()).unwrap_or("-");
        match e.kind {
            EventKind::StateChanged => info!(
                target: T, seq = e.seq, at_ms = e.at_ms,
                from = state(e.previous), to = state(e.state), "state-changed"
            ),
            EventKind::TransitionRejected => warn!(
                target: T, seq = e.seq, at_ms = e.at_ms,
                from = state(e.previous), to = state(e.state), "transition-rejected"
            ),
            EventKind::RestartRequested => {
                warn!(target: T, seq = e.seq, at_ms = e.at_ms, reason, "restart-requested")
            }
            EventKind::InputAction => info!(
                target: T, seq = e.seq, at_ms = e.at_ms,
                source = e.source.map(|s| s.as_str()).unwrap_or("-"),
                action = e.action.map(|a| a.as_str()).unwrap_or("-"),
                "input-action"
            ),
            EventKind::InputSuppressed => debug!(
                target: T, seq = e.seq, at_ms = e.at_ms,
                source = e.source.map(|s| s.as_str()).unwrap_or("-"),
                reason, "input-suppressed"
            ),
            EventKind::ScreensaverActivated => {
                info!(target: T, seq = e.seq, at_ms = e.at_ms, mode = reason, "screensaver-on")
            }
            EventKind::ScreensaverDismissed => {
                info!(target: T, seq = e.seq, at_ms = e.at_ms, "screensaver-off")
            }
            EventKind::SleepEntered => {
                info!(target: T, seq = e.seq, at_ms = e.at_ms, mode = reason, "sleep-entered")
            }
            EventKind::SleepAborted => {
                warn!(target: T, seq = e.seq, at_ms = e.at_ms, "sleep-aborted")
            }
            EventKind::Woke => info!(target: T, seq = e.seq, at_ms = e.at_ms, "woke"),
            EventKind::FaultRaised => warn!(
                target: T, seq = e.seq, at_ms = e.at_ms, fault, count = e.attempt, "fault-raised"
            ),
            EventKind::FaultCleared => {
                info!(target: T, seq = e.seq, at_ms = e.at_ms, fault, "fault-cleared")
            }
            EventKind::PingSent => debug!(target: T, seq = e.seq, at_ms = e.at_ms, "ping"),
            EventKind::PongMissed => warn!(
                target: T, seq = e.seq, at_ms = e.at_ms, waited_ms = e.delay_ms, "pong-missed"
            ),
            EventKind::ReconnectScheduled => debug!(
                target: T, seq = e.seq, at_ms = e.at_ms,
                attempt = e.attempt, delay_ms = e.delay_ms, "reconnect"
            ),
            EventKind::ReconnectExhausted => warn!(
                target: T, seq = e.seq, at_ms = e.at_ms, attempts = e.attempt, "reconnect-exhausted"
            ),
            EventKind::FetchStarted => debug!(
                target: T, seq = e.seq, at_ms = e.at_ms, generation = e.generation, reason, "fetch-started"
            ),
            EventKind::FetchCompleted => info!(
                target: T, seq = e.seq, at_ms = e.at_ms, generation = e.generation, reason, "fetch-completed"
            ),
            EventKind::SubFetchFailed => warn!(
                target: T, seq = e.seq, at_ms = e.at_ms, generation = e.generation, reason, "sub-fetch-failed"
            ),
            EventKind::LabelsUpdated => {
                info!(target: T, seq = e.seq, at_ms = e.at_ms, reason, "labels-updated")
            }
            EventKind::StaleResultDiscarded => debug!(
                target: T, seq = e.seq, at_ms = e.at_ms, generation = e.generation, "stale-result"
            ),
            EventKind::PaymentHandled => info!(
                target: T, seq = e.seq, at_ms = e.at_ms, pin = e.pin, duration_ms = e.delay_ms, mode = reason, "payment"
            ),
            EventKind::PaymentRejected => {
                warn!(target: T, seq = e.seq, at_ms = e.at_ms, reason, "payment-rejected")
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                warn!(target: T, seq = e.seq, at_ms = e.at_ms, kind = ?e.kind, reason, "subscriber")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
