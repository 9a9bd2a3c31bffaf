//! # switchcore
//!
//! **switchcore** is the orchestration core of a Lightning-paid switch
//! terminal: a small device that shows a payment code, waits for a payment
//! notification and then switches an output pin for a while.
//!
//! The crate owns the decisions, not the hardware. Screens, pins, radio,
//! sockets and the price API are collaborators behind traits; the core
//! decides which mode the device is in, what an operator gesture means,
//! when to save power, how to recover connectivity and when to refresh the
//! ticker values.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   InputPins        ConnectivityProbe        DataSource         Platform
//!  (button/touch)   (radio/http/socket)   (price, block height)  (sleep, restart)
//!       │                   │                     │                  ▲
//!       ▼                   ▼                     ▼                  │
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Device (one context object, single foreground loop)                    │
//! │  - ClickRecognizer ×2   debounced clicks and holds ─► Action            │
//! │  - StateMachine         the current OperatingState, fault overlay       │
//! │  - PowerScheduler       screensaver / deep sleep, wake grace            │
//! │  - NetworkSupervisor    link / internet / socket health, reconnects     │
//! │  - FetchCoordinator     generation-tagged sub-fetches, snapshot         │
//! └──────┬───────────────────────────┬──────────────────────────────┬───────┘
//!        ▼                           ▼                              ▼
//!   Presentation               AddressEncoder                    Switch
//!   render(Screen)             payment codes                     actuate(pin)
//!
//!        every component publishes Events
//!        ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                          │
//! │                   (capacity: RuntimeConfig::bus_capacity)               │
//! └─────────────────────────────────┬───────────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │     (in Device)        │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! ### Foreground tick
//! ```text
//! Device::on_foreground_tick()
//!   ├─► sample inputs ─► Pressed (wake gate, overlay aborts) / Action (help, report, config)
//!   ├─► overlay pages and expiry, ticker / product auto-return
//!   ├─► NetworkSupervisor::tick ─► FaultRaised / FaultCleared ─► fault overlay
//!   ├─► FetchCoordinator::run_cycle (when due)
//!   └─► PowerScheduler::tick ─► screensaver | light sleep | freeze
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                         |
//! |-------------------|----------------------------------------------------------------|--------------------------------------------|
//! | **Device**        | Build and drive the terminal core.                             | [`Device`], [`DeviceBuilder`]              |
//! | **Collaborators** | Hardware and service seams the core drives.                    | [`Presentation`], [`ConnectivityProbe`], [`DataSource`], [`Platform`] |
//! | **Subscriber API**| Hook into device events (logging, metrics, custom subscribers).| [`Subscribe`]                              |
//! | **Policies**      | Reconnect rounds and fetch backoff.                            | [`RetryPolicy`], [`BackoffPolicy`]         |
//! | **Errors**        | Typed errors for configuration, fetches and payments.          | [`ConfigError`], [`FetchError`], [`PaymentError`] |
//! | **Configuration** | Device modes and timings from TOML; runtime settings.          | [`DeviceConfig`], [`RuntimeConfig`]        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchcore::{Collaborators, DeviceBuilder, DeviceConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn run(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = DeviceConfig::from_toml_str(
//!         r#"
//!         multi_channel = "duo"
//!         ticker = "selecting"
//!         screensaver = "backlight"
//!         activation_time_minutes = 2
//!         "#,
//!     )?;
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn switchcore::Subscribe>> = vec![Arc::new(switchcore::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn switchcore::Subscribe>> = Vec::new();
//!
//!     let device = DeviceBuilder::new(cfg, collaborators)
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let token = CancellationToken::new();
//!     device.run(token).await;
//!     Ok(())
//! }
//! ```
mod clock;
mod config;
mod core;
mod device;
mod error;
mod events;
mod fetch;
mod input;
mod network;
mod policies;
mod power;
mod subscribers;

#[cfg(test)]
mod testkit;

// ---- Public re-exports ----

pub use clock::{Clock, ManualClock, Millis, MonotonicClock};
pub use config::{
    DeepSleepMode, DeviceConfig, DisplayTimings, Endpoints, FetchTimings, InputTimings,
    MultiChannelMode, NetworkTimings, PowerTimings, PulsePattern, RuntimeConfig, ScreensaverMode,
    SpecialConfig, SpecialMode, ThresholdConfig, TickerMode, Timings,
};
pub use core::{Collaborators, Device, DeviceBuilder, ExternalEvent};
pub use device::{AddressEncoder, NavigationState, OperatingState, Presentation, Screen, Switch};
pub use error::{ConfigError, FetchError, PaymentError};
pub use events::{Bus, Event, EventKind};
pub use fetch::{DataSource, DataValue, ExternalDataSnapshot, LabelSet, SwitchLabel};
pub use input::{
    Action, ActionTable, ClickSequenceState, HoldTier, InputPins, InputSource, Level, Rule,
    TouchSample, Trigger,
};
pub use network::{
    ConnectivityProbe, ErrorCounter, ErrorCounters, FaultKind, LinkHealth, LinkState,
};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use power::{ActivitySnapshot, Platform};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
