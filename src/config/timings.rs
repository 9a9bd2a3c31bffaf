//! Timing constants, grouped by the component that consumes them.
//!
//! Every field is in milliseconds unless its name says otherwise. Defaults
//! match the deployed firmware; all of them can be overridden from TOML.

use serde::Deserialize;

use crate::clock::Millis;

/// All tunable timings of the device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timings {
    pub input: InputTimings,
    pub power: PowerTimings,
    pub network: NetworkTimings,
    pub fetch: FetchTimings,
    pub display: DisplayTimings,
}

/// Click recognition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputTimings {
    /// Stability window of the external button.
    pub button_debounce_ms: Millis,
    /// Stability window of the touch line (0: relies on `min_click_gap_ms`).
    pub touch_debounce_ms: Millis,
    /// Maximum gap between two clicks of one sequence.
    pub sequence_window_ms: Millis,
    /// Re-presses closer than this to the last release are contact bounce.
    pub min_click_gap_ms: Millis,
    /// Hold on the first press that opens help.
    pub help_hold_ms: Millis,
    /// Hold on the second press that opens config mode.
    pub config_hold_ms: Millis,
}

impl Default for InputTimings {
    fn default() -> Self {
        Self {
            button_debounce_ms: 50,
            touch_debounce_ms: 0,
            sequence_window_ms: 1_000,
            min_click_gap_ms: 100,
            help_hold_ms: 2_000,
            config_hold_ms: 3_000,
        }
    }
}

/// Wake handling and sleep bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerTimings {
    /// Inputs this close to a wake are swallowed.
    pub wake_grace_ms: Millis,
    /// Longest wait for the link after a light-sleep resume.
    pub wake_link_wait_ms: Millis,
    /// Poll period of that wait.
    pub wake_link_poll_ms: Millis,
    /// Period of the idle-progress debug log.
    pub progress_log_ms: Millis,
}

impl Default for PowerTimings {
    fn default() -> Self {
        Self {
            wake_grace_ms: 1_000,
            wake_link_wait_ms: 3_000,
            wake_link_poll_ms: 100,
            progress_log_ms: 10_000,
        }
    }
}

/// Connectivity supervision cadences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkTimings {
    pub link_check_ms: Millis,
    pub internet_check_ms: Millis,
    pub internet_attempts: u32,
    pub internet_attempt_timeout_ms: Millis,
    pub internet_attempt_gap_ms: Millis,
    pub ping_interval_ms: Millis,
    pub pong_timeout_ms: Millis,
    pub socket_reconnect_attempts: u32,
    pub socket_reconnect_delay_ms: Millis,
    pub server_probe_timeout_ms: Millis,
}

impl Default for NetworkTimings {
    fn default() -> Self {
        Self {
            link_check_ms: 5_000,
            internet_check_ms: 30_000,
            internet_attempts: 3,
            internet_attempt_timeout_ms: 3_000,
            internet_attempt_gap_ms: 500,
            ping_interval_ms: 60_000,
            pong_timeout_ms: 10_000,
            socket_reconnect_attempts: 5,
            socket_reconnect_delay_ms: 2_000,
            server_probe_timeout_ms: 2_000,
        }
    }
}

/// External data refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchTimings {
    /// Regular refresh period.
    pub interval_ms: Millis,
    /// Refresh period after a cycle that left a value unavailable.
    pub error_retry_ms: Millis,
    /// Minimum distance between two attempts.
    pub backoff_ms: Millis,
    /// Wait budget of each sub-fetch.
    pub sub_fetch_timeout_ms: Millis,
    /// Pause between the two sub-fetches.
    pub settle_ms: Millis,
    /// Refresh period of the product labels once loaded.
    pub label_interval_ms: Millis,
    /// Wait budget of one label fetch.
    pub label_timeout_ms: Millis,
}

impl Default for FetchTimings {
    fn default() -> Self {
        Self {
            interval_ms: 300_000,
            error_retry_ms: 60_000,
            backoff_ms: 30_000,
            sub_fetch_timeout_ms: 4_000,
            settle_ms: 200,
            label_interval_ms: 300_000,
            label_timeout_ms: 5_000,
        }
    }
}

/// Screen durations and auto-returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayTimings {
    /// A navigated-to ticker returns to the payment screen after this.
    pub ticker_display_ms: Millis,
    /// An untouched product screen returns to selection after this.
    pub product_idle_return_ms: Millis,
    /// Presses are ignored this long after entering config mode.
    pub config_exit_guard_ms: Millis,
    pub help_page_ms: Millis,
    pub help_pages: u8,
    pub report_counters_ms: Millis,
    pub report_legend_ms: Millis,
    pub thank_you_ms: Millis,
}

impl Default for DisplayTimings {
    fn default() -> Self {
        Self {
            ticker_display_ms: 10_000,
            product_idle_return_ms: 60_000,
            config_exit_guard_ms: 2_000,
            help_page_ms: 3_000,
            help_pages: 3,
            report_counters_ms: 6_300,
            report_legend_ms: 2_100,
            thank_you_ms: 2_000,
        }
    }
}

impl DisplayTimings {
    /// Total time the help overlay stays up.
    pub fn help_total_ms(&self) -> Millis {
        self.help_page_ms.saturating_mul(Millis::from(self.help_pages))
    }

    /// Total time the report overlay stays up (counters, then one legend per fault domain).
    pub fn report_total_ms(&self) -> Millis {
        self.report_counters_ms
            .saturating_add(self.report_legend_ms.saturating_mul(3))
    }
}
