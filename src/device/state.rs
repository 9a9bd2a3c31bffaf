use std::fmt;

/// Operating mode of the terminal. Exactly one is current.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatingState {
    Initializing,
    /// Payment screen (single channel, threshold, or a product).
    Ready,
    ProductSelection,
    BtcTicker,
    ConfigMode,
    HelpScreen,
    ReportScreen,
    ErrorRecoverable,
    Screensaver,
    DeepSleep,
}

impl OperatingState {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatingState::Initializing => "initializing",
            OperatingState::Ready => "ready",
            OperatingState::ProductSelection => "product_selection",
            OperatingState::BtcTicker => "btc_ticker",
            OperatingState::ConfigMode => "config_mode",
            OperatingState::HelpScreen => "help_screen",
            OperatingState::ReportScreen => "report_screen",
            OperatingState::ErrorRecoverable => "error_recoverable",
            OperatingState::Screensaver => "screensaver",
            OperatingState::DeepSleep => "deep_sleep",
        }
    }

    /// Modes showing a payment or ticker screen with nothing in progress.
    pub fn is_idle(self) -> bool {
        matches!(
            self,
            OperatingState::Ready | OperatingState::ProductSelection | OperatingState::BtcTicker
        )
    }

    /// Modes only a restart leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, OperatingState::ConfigMode | OperatingState::DeepSleep)
    }

    /// Timed overlays started by an operator gesture.
    pub fn is_overlay(self) -> bool {
        matches!(self, OperatingState::HelpScreen | OperatingState::ReportScreen)
    }
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
