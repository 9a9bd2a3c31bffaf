//! # Device configuration.
//!
//! [`DeviceConfig`] is the read-only view of the persisted settings the
//! orchestration core consumes. Storage and the serial console that edits it
//! live elsewhere; this module only parses and validates.
//!
//! ## Sources
//! - [`DeviceConfig::default`]: factory settings (single channel, no ticker,
//!   no power saving).
//! - [`DeviceConfig::from_toml_str`] / [`DeviceConfig::from_file`]: a TOML
//!   document; unknown keys and unknown mode strings are rejected.
//!
//! ## Example
//! ```rust
//! use switchcore::{DeviceConfig, MultiChannelMode, TickerMode};
//!
//! let cfg = DeviceConfig::from_toml_str(r#"
//!     multi_channel = "duo"
//!     ticker = "selecting"
//!     screensaver = "backlight"
//!     activation_time_minutes = 2
//! "#).unwrap();
//!
//! assert_eq!(cfg.multi_channel, MultiChannelMode::Duo);
//! assert_eq!(cfg.ticker, TickerMode::Selecting);
//! assert_eq!(cfg.activation_timeout_ms(), 120_000);
//! ```

mod modes;
mod runtime;
mod timings;

pub use modes::{DeepSleepMode, MultiChannelMode, ScreensaverMode, SpecialMode, TickerMode};
pub use runtime::RuntimeConfig;
pub use timings::{DisplayTimings, FetchTimings, InputTimings, NetworkTimings, PowerTimings, Timings};

use std::path::Path;

use serde::Deserialize;

use crate::clock::Millis;
use crate::error::ConfigError;

/// Switch outputs of products 1..=4, in navigation order.
pub const PRODUCT_PINS: [u8; 4] = [12, 13, 10, 11];

const ACTIVATION_MINUTES_MIN: u32 = 1;
const ACTIVATION_MINUTES_MAX: u32 = 120;

/// Switch output used in single-channel mode.
pub const SINGLE_CHANNEL_PIN: u8 = 12;

/// Persisted device settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub multi_channel: MultiChannelMode,
    pub ticker: TickerMode,
    pub screensaver: ScreensaverMode,
    pub deep_sleep: DeepSleepMode,
    /// Idle minutes before the configured power-saving mode kicks in.
    pub activation_time_minutes: u32,
    /// Present when the device runs in threshold-payment mode.
    pub threshold: Option<ThresholdConfig>,
    /// Pulsed actuation.
    pub special: SpecialConfig,
    /// Labels of products 1..=N; missing entries fall back to the pin name.
    pub product_labels: Vec<String>,
    pub endpoints: Endpoints,
    pub timings: Timings,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            multi_channel: MultiChannelMode::Off,
            ticker: TickerMode::Off,
            screensaver: ScreensaverMode::Off,
            deep_sleep: DeepSleepMode::Off,
            activation_time_minutes: 5,
            threshold: None,
            special: SpecialConfig::default(),
            product_labels: Vec::new(),
            endpoints: Endpoints::default(),
            timings: Timings::default(),
        }
    }
}

/// Threshold-payment mode: one switch fires once the paid amount reaches `amount_sats`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    pub amount_sats: u64,
    pub pin: u8,
    pub duration_ms: Millis,
}

/// Pulsed switching: the output toggles at `frequency_hz` with an on:off
/// ratio of `duty_ratio` for the paid duration.
///
/// The presets fix both values; only [`SpecialMode::Custom`] reads them, each
/// clamped to `0.1..=10.0`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecialConfig {
    pub mode: SpecialMode,
    pub frequency_hz: f64,
    pub duty_ratio: f64,
}

impl Default for SpecialConfig {
    fn default() -> Self {
        Self {
            mode: SpecialMode::Standard,
            frequency_hz: 1.0,
            duty_ratio: 1.0,
        }
    }
}

impl SpecialConfig {
    /// On/off times of one period, `None` in standard mode.
    pub fn pulse_pattern(&self) -> Option<PulsePattern> {
        if !self.mode.is_enabled() {
            return None;
        }
        let (frequency_hz, duty_ratio) = self.mode.preset().unwrap_or((
            clamp_factor(self.frequency_hz),
            clamp_factor(self.duty_ratio),
        ));
        let period_ms = (1_000.0 / frequency_hz) as Millis;
        let on_ms = (period_ms as f64 / (1.0 + 1.0 / duty_ratio)) as Millis;
        Some(PulsePattern {
            on_ms,
            off_ms: period_ms - on_ms,
        })
    }
}

fn clamp_factor(value: f64) -> f64 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(0.1, 10.0)
}

/// One period of a pulsed actuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulsePattern {
    pub on_ms: Millis,
    pub off_ms: Millis,
}

impl PulsePattern {
    pub fn period_ms(&self) -> Millis {
        self.on_ms + self.off_ms
    }
}

/// Hosts the connectivity probe talks to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    /// Any HTTP status from this URL proves internet reachability.
    pub internet_probe_url: String,
    /// Payment backend hosting the socket.
    pub server_host: String,
    pub server_port: u16,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            internet_probe_url: "http://clients3.google.com/generate_204".to_string(),
            server_host: String::new(),
            server_port: 443,
        }
    }
}

impl DeviceConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let cfg: DeviceConfig = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks cross-field rules serde cannot express.
    ///
    /// - screensaver and deep sleep are mutually exclusive;
    /// - there are no more product labels than products.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screensaver.is_enabled() && self.deep_sleep.is_enabled() {
            return Err(ConfigError::PowerModeConflict {
                screensaver: self.screensaver.as_str(),
                deep_sleep: self.deep_sleep.as_str(),
            });
        }
        let count = self.multi_channel.product_count();
        if count > 0 && self.product_labels.len() > count {
            return Err(ConfigError::UnknownProduct {
                index: self.product_labels.len(),
                count,
            });
        }
        Ok(())
    }

    pub fn power_saving_enabled(&self) -> bool {
        self.screensaver.is_enabled() || self.deep_sleep.is_enabled()
    }

    /// Idle time after which power saving activates; the minutes are
    /// clamped to `1..=120`.
    pub fn activation_timeout_ms(&self) -> Millis {
        let minutes = self
            .activation_time_minutes
            .clamp(ACTIVATION_MINUTES_MIN, ACTIVATION_MINUTES_MAX);
        Millis::from(minutes) * 60_000
    }

    /// Switch output of product `index` (1-based); out-of-range falls back to product 1.
    pub fn product_pin(&self, index: usize) -> u8 {
        match index {
            1..=4 if index <= self.multi_channel.product_count() => PRODUCT_PINS[index - 1],
            _ => PRODUCT_PINS[0],
        }
    }

    /// Display label of product `index` (1-based).
    pub fn product_label(&self, index: usize) -> String {
        let pin = self.product_pin(index);
        index
            .checked_sub(1)
            .and_then(|i| self.product_labels.get(i))
            .filter(|label| !label.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Pin {pin}"))
    }
}
