//! # Device: the foreground loop and everything it owns.
//!
//! [`Device`] is the one context object. Each component has exactly one
//! writer, and that writer is the device: components are plain fields,
//! mutated through `&mut self` from the foreground tick or an external event.
//!
//! ## One foreground tick
//! ```text
//! on_foreground_tick()
//!   ├─ sample button + touch ─► ClickRecognizer::step ─► Pressed / Action
//!   │      Pressed: PowerScheduler::admit_input (grace / wake), overlay aborts, config exit
//!   │      Action:  help / report / config overlays
//!   ├─ overlay pages and expiry (help, report)
//!   ├─ ticker / product auto-return
//!   ├─ NetworkSupervisor::tick ─► HealthTransition ─► StateMachine fault overlay
//!   │                                              └─► link recovered: force fetch
//!   ├─ FetchCoordinator::labels_due ─► refresh_labels ─► selection redraw
//!   ├─ FetchCoordinator::due ─► run_cycle ─► ticker value refresh
//!   └─ PowerScheduler::tick ─► screensaver | light sleep | freeze
//! ```
//!
//! Network checks, fetches and power saving are skipped in config mode.
//! Labels are not fetched while an overlay or the fault screen is up; ticker
//! values only while a ticker screen is shown.
//!
//! ## Running
//! [`Device::run`] ticks on a `tokio::time::interval` until the token is
//! cancelled, and spawns a listener that forwards bus events to the
//! subscribers. Tests drive [`Device::on_foreground_tick`] directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, Millis, elapsed};
use crate::config::{
    DeepSleepMode, DeviceConfig, RuntimeConfig, SINGLE_CHANNEL_PIN, ScreensaverMode, TickerMode,
};
use crate::device::{
    AddressEncoder, FaultUpdate, NavigationState, OperatingState, PaymentScreen, Presentation,
    Screen, StateMachine, Switch, decide, idle_return, navigate_next, parse_payment,
};
use crate::events::{Bus, Event, EventKind};
use crate::fetch::{ExternalDataSnapshot, FetchCoordinator};
use crate::input::{
    Action, ClickRecognizer, ClickSequenceState, InputEvent, InputPins, InputSource, Level,
    TouchSample,
};
use crate::network::{FaultKind, HealthTransition, LinkHealth, LinkState, NetworkSupervisor};
use crate::power::{ActivitySnapshot, Admission, Platform, PowerRequest, PowerScheduler};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Notification from outside the foreground loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternalEvent {
    /// The front navigation button.
    NavigateNext,
    /// Raw payment payload from the socket.
    PaymentReceived(String),
    SocketConnected,
    SocketDisconnected,
    Pong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OverlayKind {
    Help,
    Report,
}

/// A timed overlay in progress.
#[derive(Clone, Debug)]
struct Overlay {
    kind: OverlayKind,
    started: Millis,
    shown: Screen,
}

/// Orchestration core of the payment terminal.
pub struct Device {
    cfg: DeviceConfig,
    runtime: RuntimeConfig,
    clock: Arc<dyn Clock>,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,

    machine: StateMachine,
    button: ClickRecognizer,
    touch: ClickRecognizer,
    power: PowerScheduler,
    network: NetworkSupervisor,
    fetch: FetchCoordinator,

    pins: Box<dyn InputPins>,
    presentation: Box<dyn Presentation>,
    encoder: Box<dyn AddressEncoder>,
    switch: Box<dyn Switch>,
    platform: Box<dyn Platform>,

    nav: NavigationState,
    last_navigation_ms: Millis,
    overlay: Option<Overlay>,
    display_touched: bool,
}

/// Everything [`Device::new`] wires together.
pub(crate) struct Parts {
    pub cfg: DeviceConfig,
    pub runtime: RuntimeConfig,
    pub clock: Arc<dyn Clock>,
    pub bus: Bus,
    pub subscribers: Vec<Arc<dyn Subscribe>>,
    pub network: NetworkSupervisor,
    pub fetch: FetchCoordinator,
    pub button: ClickRecognizer,
    pub touch: ClickRecognizer,
    pub pins: Box<dyn InputPins>,
    pub presentation: Box<dyn Presentation>,
    pub encoder: Box<dyn AddressEncoder>,
    pub switch: Box<dyn Switch>,
    pub platform: Box<dyn Platform>,
}

impl Device {
    pub(crate) fn new(parts: Parts) -> Self {
        let now = parts.clock.now_ms();
        Self {
            machine: StateMachine::new(parts.bus.clone(), now),
            power: PowerScheduler::new(&parts.cfg, now),
            nav: NavigationState::initial(&parts.cfg),
            last_navigation_ms: now,
            overlay: None,
            display_touched: false,
            cfg: parts.cfg,
            runtime: parts.runtime,
            clock: parts.clock,
            bus: parts.bus,
            subscribers: parts.subscribers,
            button: parts.button,
            touch: parts.touch,
            network: parts.network,
            fetch: parts.fetch,
            pins: parts.pins,
            presentation: parts.presentation,
            encoder: parts.encoder,
            switch: parts.switch,
            platform: parts.platform,
        }
    }

    // ---- accessors ----

    pub fn current_state(&self) -> OperatingState {
        self.machine.current()
    }

    pub fn previous_state(&self) -> Option<OperatingState> {
        self.machine.previous()
    }

    /// Whether a restart was requested and the device has not booted since.
    pub fn restart_pending(&self) -> bool {
        self.machine.restart_pending()
    }

    /// Sequence state of the button or touch recognizer.
    pub fn click_sequence(&self, source: InputSource) -> ClickSequenceState {
        match source {
            InputSource::Button => self.button.state(),
            InputSource::Touch => self.touch.state(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.cfg
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn health(&self) -> &LinkHealth {
        self.network.health()
    }

    pub fn external_data(&self) -> &ExternalDataSnapshot {
        self.fetch.snapshot()
    }

    pub fn activity(&self) -> &ActivitySnapshot {
        self.power.snapshot()
    }

    pub fn navigation(&self) -> NavigationState {
        self.nav
    }

    /// Fault the overlay shows, if any.
    pub fn shown_fault(&self) -> Option<FaultKind> {
        self.machine.fault()
    }

    // ---- lifecycle ----

    /// Boots into the payment screen.
    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.boot(now);
    }

    fn boot(&mut self, now: Millis) {
        self.machine.transition(OperatingState::Initializing, now);
        self.presentation.render(Screen::Boot);
        self.platform.set_backlight(true);
        self.nav = NavigationState::initial(&self.cfg);
        self.last_navigation_ms = now;
        self.overlay = None;
        self.power = PowerScheduler::new(&self.cfg, now);
        info!(
            target: "switchcore::device",
            multi_channel = self.cfg.multi_channel.as_str(),
            ticker = self.cfg.ticker.as_str(),
            screensaver = self.cfg.screensaver.as_str(),
            deep_sleep = self.cfg.deep_sleep.as_str(),
            "boot"
        );
        self.redraw(now);
    }

    /// Runs the foreground loop until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) {
        self.drive(None, token).await;
    }

    /// Like [`run`](Self::run), also handling external events from `events`.
    pub async fn run_with_events(
        self,
        events: mpsc::Receiver<ExternalEvent>,
        token: CancellationToken,
    ) {
        self.drive(Some(events), token).await;
    }

    async fn drive(
        mut self,
        mut events: Option<mpsc::Receiver<ExternalEvent>>,
        token: CancellationToken,
    ) {
        let listener = self.subscriber_listener(token.clone());
        self.start();

        let mut interval = tokio::time::interval(self.runtime.tick_period_clamped());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let next_event = async {
                match events.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => self.on_foreground_tick().await,
                Some(ev) = next_event => self.on_external_event(ev).await,
            }
        }
        info!(target: "switchcore::device", "foreground loop stopped");
        if let Err(e) = listener.await {
            warn!(target: "switchcore::events", error = %e, "subscriber listener failed");
        }
    }

    /// Forwards bus events to the subscriber set until cancelled.
    fn subscriber_listener(&mut self, token: CancellationToken) -> tokio::task::JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(std::mem::take(&mut self.subscribers), self.bus.clone());
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(target: "switchcore::device", skipped = n, "event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            set.shutdown().await;
        })
    }

    // ---- foreground tick ----

    /// One pass of the cooperative loop.
    pub async fn on_foreground_tick(&mut self) {
        let now = self.clock.now_ms();
        self.poll_inputs(now);
        self.advance_overlay(now);
        self.auto_return(now);

        if self.machine.is_in_state(OperatingState::ConfigMode) {
            return;
        }
        self.supervise_network(now).await;
        self.refresh_labels().await;
        self.refresh_external_data().await;
        self.apply_power_policy().await;
    }

    fn poll_inputs(&mut self, now: Millis) {
        let level = self.pins.button_level();
        if let Some(ev) = self.button.step(level, now) {
            self.on_input(InputSource::Button, ev, now);
        }

        // no controller fitted: the button alone drives the device
        let Some(sample) = self.pins.touch_sample() else {
            return;
        };
        let (strip_level, display_touch) = match sample {
            TouchSample::Pressed { x, y } if self.presentation.is_within_primary_area(x, y) => {
                (Level::High, true)
            }
            TouchSample::Pressed { .. } => (Level::Low, false),
            TouchSample::Released => (Level::High, false),
        };
        if let Some(ev) = self.touch.step(strip_level, now) {
            self.on_input(InputSource::Touch, ev, now);
        }
        if display_touch && !self.display_touched {
            self.on_press(None, true, now);
        }
        self.display_touched = display_touch;
    }

    fn on_input(&mut self, source: InputSource, ev: InputEvent, now: Millis) {
        match ev {
            InputEvent::Pressed => self.on_press(Some(source), false, now),
            InputEvent::Action(action) => self.on_action(source, action, now),
        }
    }

    fn cancel_sequence(&mut self, source: Option<InputSource>) {
        match source {
            Some(InputSource::Button) => self.button.cancel_sequence(),
            Some(InputSource::Touch) => self.touch.cancel_sequence(),
            None => {}
        }
    }

    /// Runs the wake gate. Returns `true` if the input may act.
    fn admit(&mut self, source: Option<InputSource>, now: Millis) -> bool {
        let reason = match self.power.admit_input(now) {
            Admission::Proceed => return true,
            Admission::Suppressed => "grace",
            Admission::Woke => {
                self.platform.set_backlight(true);
                self.bus.publish(Event::new(EventKind::ScreensaverDismissed, now));
                self.redraw(now);
                "wake"
            }
        };
        self.cancel_sequence(source);
        let mut ev = Event::new(EventKind::InputSuppressed, now).with_reason(reason);
        if let Some(source) = source {
            ev = ev.with_source(source);
        }
        self.bus.publish(ev);
        false
    }

    /// A stable press from a recognizer (`source`) or a display touch.
    fn on_press(&mut self, source: Option<InputSource>, primary_area: bool, now: Millis) {
        if !self.admit(source, now) {
            return;
        }
        match self.machine.current() {
            OperatingState::HelpScreen => {
                self.cancel_sequence(source);
                if primary_area {
                    self.enter_config(now);
                } else {
                    self.enter_report(now);
                }
            }
            OperatingState::ReportScreen => {
                self.cancel_sequence(source);
                debug!(target: "switchcore::device", "report aborted by press");
                self.redraw(now);
            }
            OperatingState::ConfigMode => {
                self.cancel_sequence(source);
                let guard = self.cfg.timings.display.config_exit_guard_ms;
                if elapsed(now, self.machine.entered_at()) >= guard {
                    self.restart("config exit", now);
                }
            }
            _ => {}
        }
    }

    fn on_action(&mut self, source: InputSource, action: Action, now: Millis) {
        let state = self.machine.current();
        if !(state.is_idle() || state == OperatingState::ErrorRecoverable) {
            debug!(target: "switchcore::device", action = action.as_str(), state = state.as_str(), "action ignored");
            return;
        }
        if !self.admit(Some(source), now) {
            return;
        }
        self.bus.publish(
            Event::new(EventKind::InputAction, now)
                .with_source(source)
                .with_action(action),
        );
        match action {
            Action::Help => self.enter_help(now),
            Action::Report => self.enter_report(now),
            Action::Config => self.enter_config(now),
            Action::Reset => {
                info!(target: "switchcore::device", source = source.as_str(), "reset gesture, nothing to do")
            }
        }
    }

    // ---- overlays ----

    fn enter_help(&mut self, now: Millis) {
        if self.machine.transition(OperatingState::HelpScreen, now) {
            self.show_overlay(OverlayKind::Help, Screen::HelpPage(1), now);
        }
    }

    fn enter_report(&mut self, now: Millis) {
        if self.machine.transition(OperatingState::ReportScreen, now) {
            let counters = self.network.health().errors;
            self.show_overlay(OverlayKind::Report, Screen::Report(counters), now);
        }
    }

    fn enter_config(&mut self, now: Millis) {
        if self.machine.transition(OperatingState::ConfigMode, now) {
            self.overlay = None;
            self.presentation.render(Screen::Config);
        }
    }

    fn show_overlay(&mut self, kind: OverlayKind, first: Screen, now: Millis) {
        self.presentation.render(first.clone());
        self.overlay = Some(Overlay {
            kind,
            started: now,
            shown: first,
        });
    }

    fn overlay_screen(&self, kind: OverlayKind, since: Millis) -> Option<Screen> {
        let display = &self.cfg.timings.display;
        match kind {
            OverlayKind::Help => {
                if since >= display.help_total_ms() {
                    return None;
                }
                let page = since / display.help_page_ms.max(1) + 1;
                Some(Screen::HelpPage(page as u8))
            }
            OverlayKind::Report => {
                if since >= display.report_total_ms() {
                    return None;
                }
                if since < display.report_counters_ms {
                    return Some(Screen::Report(self.network.health().errors));
                }
                let legend = (since - display.report_counters_ms) / display.report_legend_ms.max(1);
                FaultKind::ALL
                    .get(legend as usize)
                    .map(|kind| Screen::ReportLegend(*kind))
            }
        }
    }

    fn advance_overlay(&mut self, now: Millis) {
        let Some(overlay) = &self.overlay else {
            return;
        };
        let expected = match overlay.kind {
            OverlayKind::Help => OperatingState::HelpScreen,
            OverlayKind::Report => OperatingState::ReportScreen,
        };
        if !self.machine.is_in_state(expected) {
            self.overlay = None;
            return;
        }
        match self.overlay_screen(overlay.kind, elapsed(now, overlay.started)) {
            Some(screen) if screen == overlay.shown => {}
            Some(screen) => {
                self.presentation.render(screen.clone());
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.shown = screen;
                }
            }
            None => {
                debug!(target: "switchcore::device", kind = ?overlay.kind, "overlay expired");
                self.redraw(now);
            }
        }
    }

    // ---- navigation ----

    fn on_navigate(&mut self, now: Millis) {
        if !self.admit(None, now) {
            return;
        }
        if !self.machine.current().is_idle() {
            return;
        }
        self.nav = navigate_next(&self.cfg, self.nav);
        self.last_navigation_ms = now;
        debug!(
            target: "switchcore::device",
            product = self.nav.current_product,
            ticker = self.nav.ticker_active,
            "navigate"
        );
        self.redraw(now);
    }

    fn auto_return(&mut self, now: Millis) {
        if !self.machine.current().is_idle() {
            return;
        }
        let since = elapsed(now, self.last_navigation_ms);
        let display = &self.cfg.timings.display;
        let multi = self.cfg.multi_channel.is_enabled();
        let navigated_ticker = self.cfg.ticker == TickerMode::Selecting
            && if multi {
                self.nav.current_product == NavigationState::TICKER
            } else {
                self.nav.ticker_active
            };
        let idle_product = multi && self.nav.current_product >= 1;

        let due = (navigated_ticker && since >= display.ticker_display_ms)
            || (idle_product && since >= display.product_idle_return_ms);
        if due {
            self.nav = idle_return(&self.cfg, self.nav);
            self.last_navigation_ms = now;
            self.redraw(now);
        }
    }

    /// Shows the pending fault overlay, or the payment screen the policy picks.
    fn redraw(&mut self, now: Millis) {
        if self.machine.current().is_terminal() {
            return;
        }
        self.overlay = None;
        if let Some(kind) = self.machine.fault() {
            self.machine.transition(OperatingState::ErrorRecoverable, now);
            self.presentation.render(Screen::Error(kind));
            return;
        }

        let choice = decide(&self.cfg, self.nav);
        self.machine.transition(choice.operating_state(), now);
        let screen = match choice {
            PaymentScreen::Threshold => {
                let (pin, amount_sats) = self
                    .cfg
                    .threshold
                    .as_ref()
                    .map(|t| (t.pin, t.amount_sats))
                    .unwrap_or((SINGLE_CHANNEL_PIN, 0));
                Screen::ThresholdPayment {
                    address: self.queue_address(pin),
                    amount_sats,
                }
            }
            PaymentScreen::Special => Screen::SpecialPayment {
                address: self.queue_address(SINGLE_CHANNEL_PIN),
                mode: self.cfg.special.mode,
            },
            PaymentScreen::SingleChannel => Screen::Payment {
                address: self.queue_address(SINGLE_CHANNEL_PIN),
            },
            PaymentScreen::ProductSelection => Screen::ProductSelection {
                labels: (1..=self.cfg.multi_channel.product_count())
                    .map(|i| self.product_label(i))
                    .collect(),
            },
            PaymentScreen::Ticker => Screen::Ticker(*self.fetch.snapshot()),
            PaymentScreen::Product(index) => {
                let pin = self.cfg.product_pin(index as usize);
                Screen::Product {
                    index,
                    label: self.product_label(index as usize),
                    address: self.queue_address(pin),
                }
            }
        };
        self.presentation.render(screen);
    }

    /// Fetched label of the product's pin, else the configured one.
    fn product_label(&self, index: usize) -> String {
        let pin = self.cfg.product_pin(index);
        match self.fetch.labels().label_for(pin) {
            Some(label) => label.to_string(),
            None => self.cfg.product_label(index),
        }
    }

    fn queue_address(&mut self, channel: u8) -> String {
        let address = self.encoder.generate_address(channel);
        self.encoder.apply_to_display_queue(&address);
        address
    }

    // ---- network ----

    async fn supervise_network(&mut self, now: Millis) {
        let transitions = self.network.tick(now).await;
        if !transitions.is_empty() {
            let now = self.clock.now_ms();
            self.fold_health(transitions, now);
        }
    }

    fn fold_health(&mut self, transitions: Vec<HealthTransition>, now: Millis) {
        for transition in transitions {
            let was_showing = self.machine.is_in_state(OperatingState::ErrorRecoverable);
            let remaining = self.network.health().highest_fault();
            let update = match transition {
                HealthTransition::Raised(FaultKind::Link)
                | HealthTransition::Cleared(FaultKind::Link) => {
                    let wifi = self.network.health().wifi;
                    if wifi == LinkState::Connected {
                        info!(target: "switchcore::device", "link recovered, forcing data refresh");
                        self.fetch.force_refresh();
                    }
                    self.machine.update_wifi_state(wifi, remaining, now)
                }
                HealthTransition::Raised(kind) => self.machine.raise_fault(kind, now),
                HealthTransition::Cleared(kind) => self.machine.resolve_fault(kind, remaining, now),
            };
            match update {
                FaultUpdate::Unchanged => {}
                FaultUpdate::Shown(kind) => {
                    if self.machine.is_in_state(OperatingState::ErrorRecoverable) {
                        self.overlay = None;
                        self.presentation.render(Screen::Error(kind));
                    }
                }
                FaultUpdate::Recovered if was_showing => self.redraw(now),
                FaultUpdate::Recovered => {}
            }
        }
    }

    // ---- external data ----

    async fn refresh_labels(&mut self) {
        if !self.cfg.multi_channel.is_enabled() {
            return;
        }
        if matches!(
            self.machine.current(),
            OperatingState::ErrorRecoverable
                | OperatingState::HelpScreen
                | OperatingState::ReportScreen
        ) {
            return;
        }
        let now = self.clock.now_ms();
        if !self.fetch.labels_due(now, self.network.link_up()) {
            return;
        }
        if self.fetch.refresh_labels(now).await
            && self.machine.is_in_state(OperatingState::ProductSelection)
        {
            let now = self.clock.now_ms();
            self.redraw(now);
        }
    }

    async fn refresh_external_data(&mut self) {
        let now = self.clock.now_ms();
        // only a ticker on screen consumes the values
        let consuming = self.machine.is_in_state(OperatingState::BtcTicker);
        if !self.fetch.due(now, consuming, self.network.link_up()) {
            return;
        }
        let snapshot = *self.fetch.run_cycle(now).await;
        if self.machine.is_in_state(OperatingState::BtcTicker) {
            self.presentation.render(Screen::TickerValues(snapshot));
        }
    }

    // ---- power ----

    async fn apply_power_policy(&mut self) {
        let now = self.clock.now_ms();
        let state = self.machine.current();
        if !(state.is_idle() || state == OperatingState::ErrorRecoverable) {
            return;
        }
        match self.power.tick(now, state.is_idle()) {
            None => {}
            Some(PowerRequest::Screensaver(mode)) => self.start_screensaver(mode, now),
            Some(PowerRequest::Sleep(mode)) => self.enter_sleep(mode, now).await,
        }
    }

    fn start_screensaver(&mut self, mode: ScreensaverMode, now: Millis) {
        self.machine.transition(OperatingState::Screensaver, now);
        self.overlay = None;
        self.presentation.render(Screen::Screensaver(mode));
        if mode == ScreensaverMode::Backlight {
            self.platform.set_backlight(false);
        }
        self.bus.publish(
            Event::new(EventKind::ScreensaverActivated, now).with_reason(mode.as_str()),
        );
    }

    async fn enter_sleep(&mut self, mode: DeepSleepMode, now: Millis) {
        if mode == DeepSleepMode::Freeze && self.platform.wake_button_asserted() {
            warn!(target: "switchcore::power", "wake button asserted, freeze aborted");
            self.bus.publish(Event::new(EventKind::SleepAborted, now));
            self.power.abort_sleep(now);
            return;
        }
        if !self.machine.transition(OperatingState::DeepSleep, now) {
            self.power.abort_sleep(now);
            return;
        }
        self.bus
            .publish(Event::new(EventKind::SleepEntered, now).with_reason(mode.as_str()));
        self.platform.prepare_for_sleep();
        self.platform.disable_watchdog();

        match mode {
            DeepSleepMode::Light => {
                self.platform.light_sleep();
                let now = self.clock.now_ms();
                self.bus.publish(Event::new(EventKind::Woke, now));
                self.resume_after_light_sleep().await;
            }
            DeepSleepMode::Freeze => {
                self.platform.freeze();
                // freeze returned: start over
                let now = self.clock.now_ms();
                self.bus.publish(Event::new(EventKind::Woke, now));
                self.boot(now);
                self.power.note_wake(now);
            }
            DeepSleepMode::Off => {}
        }
    }

    async fn resume_after_light_sleep(&mut self) {
        let now = self.clock.now_ms();
        self.machine.transition(OperatingState::Initializing, now);
        self.presentation.render(Screen::Boot);
        self.platform.set_backlight(true);

        let timings = self.cfg.timings.power;
        let polls = timings.wake_link_wait_ms / timings.wake_link_poll_ms.max(1);
        for _ in 0..polls {
            if self.network.poll_link_status() == LinkState::Connected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(timings.wake_link_poll_ms)).await;
        }

        let now = self.clock.now_ms();
        self.power.resume_after_light_sleep(now);
        info!(target: "switchcore::power", now, "resumed from light sleep");
        self.redraw(now);
    }

    fn restart(&mut self, reason: &str, now: Millis) {
        if !self.machine.request_restart(reason, now) {
            return;
        }
        self.platform.restart();
        // restart returned: start over
        let now = self.clock.now_ms();
        self.boot(now);
    }

    // ---- external events ----

    /// Handles one notification from outside the foreground loop.
    pub async fn on_external_event(&mut self, event: ExternalEvent) {
        let now = self.clock.now_ms();
        match event {
            ExternalEvent::NavigateNext => self.on_navigate(now),
            ExternalEvent::PaymentReceived(payload) => self.on_payment(&payload, now).await,
            ExternalEvent::SocketConnected => {
                if let Some(t) = self.network.on_socket_connected(now) {
                    self.fold_health(vec![t], now);
                }
            }
            ExternalEvent::SocketDisconnected => self.network.on_socket_disconnected(now),
            ExternalEvent::Pong => self.network.on_pong(now),
        }
    }

    async fn on_payment(&mut self, payload: &str, now: Millis) {
        let state = self.machine.current();
        if matches!(
            state,
            OperatingState::Initializing | OperatingState::ConfigMode | OperatingState::DeepSleep
        ) {
            warn!(target: "switchcore::device", state = state.as_str(), "payment while not accepting");
            self.bus.publish(
                Event::new(EventKind::PaymentRejected, now)
                    .with_reason(format!("not accepting in {state}")),
            );
            return;
        }
        self.power.on_activity(now);

        let actuation = match parse_payment(payload, &self.cfg) {
            Ok(a) => a,
            Err(e) => {
                warn!(target: "switchcore::device", error = e.as_label(), "payment dropped: {}", e.as_message());
                self.bus.publish(
                    Event::new(EventKind::PaymentRejected, now)
                        .with_reason(format!("{}: {}", e.as_label(), e.as_message())),
                );
                return;
            }
        };

        if self.power.dismiss_screensaver(now) {
            self.platform.set_backlight(true);
            self.bus.publish(Event::new(EventKind::ScreensaverDismissed, now));
        }
        info!(target: "switchcore::device", pin = actuation.pin, duration_ms = actuation.duration_ms, "payment received");
        let duration = Duration::from_millis(actuation.duration_ms);
        let special = self.cfg.special.mode;
        match self.cfg.special.pulse_pattern() {
            Some(pattern) => {
                debug!(
                    target: "switchcore::device",
                    mode = special.as_str(),
                    on_ms = pattern.on_ms,
                    off_ms = pattern.off_ms,
                    "pulsed actuation"
                );
                self.presentation.render(Screen::SpecialSwitching {
                    pin: actuation.pin,
                    mode: special,
                });
                self.switch.pulse(actuation.pin, pattern, duration).await;
            }
            None => {
                self.presentation
                    .render(Screen::SwitchedOn { pin: actuation.pin });
                self.switch.actuate(actuation.pin, duration).await;
            }
        }
        self.presentation.render(Screen::ThankYou);

        let done = self.clock.now_ms();
        self.power.on_activity(done);
        let mut handled = Event::new(EventKind::PaymentHandled, done)
            .with_pin(actuation.pin)
            .with_delay_ms(actuation.duration_ms);
        if special.is_enabled() {
            handled = handled.with_reason(special.as_str());
        }
        self.bus.publish(handled);
        tokio::time::sleep(Duration::from_millis(self.cfg.timings.display.thank_you_ms)).await;

        let now = self.clock.now_ms();
        self.power.on_activity(now);
        self.redraw(now);
    }
}
