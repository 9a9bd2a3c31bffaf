//! Operating-mode enums read from the persisted configuration.
//!
//! Each enum deserializes from its lowercase name; any other string is
//! rejected by serde.

use std::fmt;

use serde::Deserialize;

/// Number of switchable products shown on the selection screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiChannelMode {
    /// Single payment screen, single switch.
    #[default]
    Off,
    /// Two products.
    Duo,
    /// Four products.
    Quattro,
}

impl MultiChannelMode {
    /// Number of products this mode navigates through (0 when off).
    pub fn product_count(self) -> usize {
        match self {
            MultiChannelMode::Off => 0,
            MultiChannelMode::Duo => 2,
            MultiChannelMode::Quattro => 4,
        }
    }

    pub fn is_enabled(self) -> bool {
        !matches!(self, MultiChannelMode::Off)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MultiChannelMode::Off => "off",
            MultiChannelMode::Duo => "duo",
            MultiChannelMode::Quattro => "quattro",
        }
    }
}

/// When the price/height ticker is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerMode {
    #[default]
    Off,
    /// The ticker replaces the payment screen permanently.
    Always,
    /// The ticker is one more stop when navigating.
    Selecting,
}

impl TickerMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, TickerMode::Off)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TickerMode::Off => "off",
            TickerMode::Always => "always",
            TickerMode::Selecting => "selecting",
        }
    }
}

/// What an idle timeout does to the display when the CPU stays up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreensaverMode {
    #[default]
    Off,
    /// Draw a black screen, backlight on.
    Black,
    /// Switch the backlight off.
    Backlight,
}

impl ScreensaverMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, ScreensaverMode::Off)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScreensaverMode::Off => "off",
            ScreensaverMode::Black => "black",
            ScreensaverMode::Backlight => "backlight",
        }
    }
}

/// What an idle timeout does to the CPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeepSleepMode {
    #[default]
    Off,
    /// CPU pauses and resumes in place on a button wake.
    Light,
    /// Only always-on domains stay powered; wake reboots.
    Freeze,
}

impl DeepSleepMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, DeepSleepMode::Off)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeepSleepMode::Off => "off",
            DeepSleepMode::Light => "light",
            DeepSleepMode::Freeze => "freeze",
        }
    }
}

/// How a payment drives the switch output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialMode {
    /// Steady on for the paid duration.
    #[default]
    Standard,
    /// 1 Hz, 1:1.
    Blink,
    /// 2 Hz, 1:4.
    Pulse,
    /// 5 Hz, 1:1.
    FastBlink,
    /// Frequency and duty ratio from the configuration.
    Custom,
}

impl SpecialMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, SpecialMode::Standard)
    }

    /// `(frequency_hz, on:off ratio)` of the presets.
    pub fn preset(self) -> Option<(f64, f64)> {
        match self {
            SpecialMode::Blink => Some((1.0, 1.0)),
            SpecialMode::Pulse => Some((2.0, 0.25)),
            SpecialMode::FastBlink => Some((5.0, 1.0)),
            SpecialMode::Standard | SpecialMode::Custom => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpecialMode::Standard => "standard",
            SpecialMode::Blink => "blink",
            SpecialMode::Pulse => "pulse",
            SpecialMode::FastBlink => "fast-blink",
            SpecialMode::Custom => "custom",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(MultiChannelMode, TickerMode, ScreensaverMode, DeepSleepMode, SpecialMode);
