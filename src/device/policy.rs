//! Which payment screen to show, as a pure function of configuration and
//! navigation state.

use crate::config::{DeviceConfig, TickerMode};

use super::state::OperatingState;

/// Navigation position.
///
/// `current_product`: `-1` selection screen, `0` ticker, `1..=N` product.
/// Only meaningful in multi-channel mode; single channel uses `ticker_active`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationState {
    pub current_product: i8,
    pub ticker_active: bool,
}

impl NavigationState {
    pub const SELECTION: i8 = -1;
    pub const TICKER: i8 = 0;

    /// Position after boot or an idle return.
    pub fn initial(cfg: &DeviceConfig) -> Self {
        let current_product = if cfg.ticker == TickerMode::Always {
            Self::TICKER
        } else {
            Self::SELECTION
        };
        Self {
            current_product,
            ticker_active: false,
        }
    }
}

/// Outcome of [`decide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentScreen {
    Threshold,
    /// Pulsed switching announced on the payment screen.
    Special,
    SingleChannel,
    ProductSelection,
    Ticker,
    /// 1-based product index.
    Product(u8),
}

impl PaymentScreen {
    /// Mode the state machine is in while this screen is up.
    pub fn operating_state(self) -> OperatingState {
        match self {
            PaymentScreen::Threshold
            | PaymentScreen::Special
            | PaymentScreen::SingleChannel
            | PaymentScreen::Product(_) => OperatingState::Ready,
            PaymentScreen::ProductSelection => OperatingState::ProductSelection,
            PaymentScreen::Ticker => OperatingState::BtcTicker,
        }
    }
}

/// Threshold mode wins, then a special mode, then multi-channel navigation,
/// then the single-channel ticker setting.
pub fn decide(cfg: &DeviceConfig, nav: NavigationState) -> PaymentScreen {
    if cfg.threshold.is_some() {
        return PaymentScreen::Threshold;
    }
    if cfg.special.mode.is_enabled() {
        return PaymentScreen::Special;
    }
    let count = cfg.multi_channel.product_count();
    if count > 0 {
        return match nav.current_product {
            NavigationState::TICKER => PaymentScreen::Ticker,
            n if n >= 1 && (n as usize) <= count => PaymentScreen::Product(n as u8),
            _ => PaymentScreen::ProductSelection,
        };
    }
    match cfg.ticker {
        TickerMode::Off => PaymentScreen::SingleChannel,
        TickerMode::Always => PaymentScreen::Ticker,
        TickerMode::Selecting if nav.ticker_active => PaymentScreen::Ticker,
        TickerMode::Selecting => PaymentScreen::SingleChannel,
    }
}

/// One press of the navigation button.
pub fn navigate_next(cfg: &DeviceConfig, nav: NavigationState) -> NavigationState {
    let count = cfg.multi_channel.product_count() as i8;
    if count == 0 {
        let ticker_active = match cfg.ticker {
            TickerMode::Selecting => !nav.ticker_active,
            _ => nav.ticker_active,
        };
        return NavigationState { ticker_active, ..nav };
    }
    let current_product = match nav.current_product {
        n if n < 1 => 1,
        n if n < count => n + 1,
        _ if cfg.ticker == TickerMode::Selecting => NavigationState::TICKER,
        _ => 1,
    };
    NavigationState {
        current_product,
        ..nav
    }
}

/// Position an idle product or navigated ticker returns to.
pub fn idle_return(cfg: &DeviceConfig, nav: NavigationState) -> NavigationState {
    if cfg.multi_channel.product_count() == 0 {
        return NavigationState {
            ticker_active: false,
            ..nav
        };
    }
    NavigationState::initial(cfg)
}
