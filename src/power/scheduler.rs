use tracing::{debug, info};

use crate::clock::{Millis, elapsed};
use crate::config::{DeepSleepMode, DeviceConfig, PowerTimings, ScreensaverMode};

/// Power state as seen by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    Active,
    Screensaver,
    DeepSleep,
}

/// Activity bookkeeping owned by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub last_activity_ms: Millis,
    /// Set by a wake, cleared once the grace window has passed.
    pub last_wake_up_ms: Option<Millis>,
    pub screensaver: ScreensaverMode,
    pub deep_sleep: DeepSleepMode,
    pub activation_timeout_ms: Millis,
}

/// Verdict on an input event, see [`PowerScheduler::admit_input`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Handle the input normally.
    Proceed,
    /// The input woke the screensaver; it must not act as a command.
    Woke,
    /// Inside the grace window after a wake; drop the input.
    Suppressed,
}

/// What the idle timeout asks the device to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerRequest {
    Screensaver(ScreensaverMode),
    Sleep(DeepSleepMode),
}

/// Arbitrates screensaver and deep sleep from user-activity recency.
#[derive(Clone, Debug)]
pub struct PowerScheduler {
    snapshot: ActivitySnapshot,
    timings: PowerTimings,
    state: PowerState,
    last_progress_log_ms: Millis,
}

impl PowerScheduler {
    pub fn new(cfg: &DeviceConfig, now: Millis) -> Self {
        Self {
            snapshot: ActivitySnapshot {
                last_activity_ms: now,
                last_wake_up_ms: None,
                screensaver: cfg.screensaver,
                deep_sleep: cfg.deep_sleep,
                activation_timeout_ms: cfg.activation_timeout_ms(),
            },
            timings: cfg.timings.power,
            state: PowerState::Active,
            last_progress_log_ms: now,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn snapshot(&self) -> &ActivitySnapshot {
        &self.snapshot
    }

    /// Records an activity pulse.
    pub fn on_activity(&mut self, now: Millis) {
        self.snapshot.last_activity_ms = now;
    }

    /// Whether `now` falls inside the grace window of the last wake.
    pub fn in_grace(&self, now: Millis) -> bool {
        self.snapshot
            .last_wake_up_ms
            .is_some_and(|woke| elapsed(now, woke) < self.timings.wake_grace_ms)
    }

    /// Gatekeeper for every navigation-capable input.
    ///
    /// Inside the grace window the input is suppressed. Past it the wake
    /// sentinel is cleared, the input counts as activity, and an active
    /// screensaver is dismissed (the input then only woke the device).
    pub fn admit_input(&mut self, now: Millis) -> Admission {
        if self.in_grace(now) {
            debug!(target: "switchcore::power", now, "input suppressed inside wake grace");
            return Admission::Suppressed;
        }
        self.snapshot.last_wake_up_ms = None;
        self.on_activity(now);

        if self.state == PowerState::Screensaver {
            self.state = PowerState::Active;
            self.snapshot.last_wake_up_ms = Some(now);
            info!(target: "switchcore::power", now, "screensaver dismissed by input");
            return Admission::Woke;
        }
        Admission::Proceed
    }

    /// Leaves the screensaver without arming the grace window (payments).
    ///
    /// Returns `true` if the screensaver was active.
    pub fn dismiss_screensaver(&mut self, now: Millis) -> bool {
        self.on_activity(now);
        if self.state != PowerState::Screensaver {
            return false;
        }
        self.state = PowerState::Active;
        true
    }

    /// Compares idle time with the activation timeout.
    ///
    /// Returns a request at most once per idle period; the device reports
    /// back through [`resume_after_light_sleep`](Self::resume_after_light_sleep)
    /// or [`abort_sleep`](Self::abort_sleep). `sleep_permitted` is false while
    /// the device is in a mode deep sleep may not interrupt.
    pub fn tick(&mut self, now: Millis, sleep_permitted: bool) -> Option<PowerRequest> {
        if self.state != PowerState::Active {
            return None;
        }
        let s = &self.snapshot;
        if !s.screensaver.is_enabled() && !s.deep_sleep.is_enabled() {
            return None;
        }

        let idle = elapsed(now, s.last_activity_ms);
        if elapsed(now, self.last_progress_log_ms) >= self.timings.progress_log_ms {
            self.last_progress_log_ms = now;
            debug!(
                target: "switchcore::power",
                idle_ms = idle,
                timeout_ms = s.activation_timeout_ms,
                "idle progress"
            );
        }
        if idle < s.activation_timeout_ms {
            return None;
        }

        if s.screensaver.is_enabled() {
            let mode = s.screensaver;
            self.state = PowerState::Screensaver;
            info!(target: "switchcore::power", idle_ms = idle, mode = mode.as_str(), "screensaver activated");
            return Some(PowerRequest::Screensaver(mode));
        }
        if sleep_permitted {
            let mode = s.deep_sleep;
            self.state = PowerState::DeepSleep;
            info!(target: "switchcore::power", idle_ms = idle, mode = mode.as_str(), "deep sleep requested");
            return Some(PowerRequest::Sleep(mode));
        }
        None
    }

    /// Back from a light sleep: fresh activity and a fresh grace window.
    pub fn resume_after_light_sleep(&mut self, now: Millis) {
        self.state = PowerState::Active;
        self.note_wake(now);
    }

    /// Arms the grace window of a wake the scheduler did not see, such as
    /// the cold boot after a freeze.
    pub fn note_wake(&mut self, now: Millis) {
        self.snapshot.last_activity_ms = now;
        self.snapshot.last_wake_up_ms = Some(now);
    }

    /// Sleep entry was refused; count a full timeout again from `now`.
    pub fn abort_sleep(&mut self, now: Millis) {
        self.state = PowerState::Active;
        self.snapshot.last_activity_ms = now;
    }
}
