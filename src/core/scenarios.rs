//! End-to-end scenarios: a whole [`Device`] on tokio's paused clock, every
//! collaborator faked.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::clock::{Clock, Millis, MonotonicClock};
use crate::config::{
    DeepSleepMode, DeviceConfig, MultiChannelMode, ScreensaverMode, SpecialMode, TickerMode,
};
use crate::error::FetchError;
use crate::device::{OperatingState, Screen};
use crate::events::{Event, EventKind};
use crate::fetch::{DataValue, SwitchLabel};
use crate::network::{FaultKind, LinkState};
use crate::testkit::{
    BUTTON_STRIP_Y, FakeEncoder, FakePlatform, FakeProbe, FakeSource, RecordingPresentation,
    RecordingSwitch, Reply, ScriptedPins,
};

use super::{Collaborators, Device, DeviceBuilder, ExternalEvent};

const TICK_MS: Millis = 10;

struct Rig {
    device: Device,
    clock: Arc<MonotonicClock>,
    pins: ScriptedPins,
    screen: RecordingPresentation,
    encoder: FakeEncoder,
    switch: RecordingSwitch,
    platform: FakePlatform,
    probe: Arc<FakeProbe>,
    source: Arc<FakeSource>,
    events: broadcast::Receiver<Event>,
}

fn rig(cfg: DeviceConfig) -> Rig {
    rig_with(cfg, FakeSource::answering(60_000, 870_000), false)
}

fn rig_with(cfg: DeviceConfig, source: Arc<FakeSource>, touch_fitted: bool) -> Rig {
    let clock = Arc::new(MonotonicClock::new());
    let pins = ScriptedPins::new(touch_fitted);
    let screen = RecordingPresentation::default();
    let encoder = FakeEncoder::default();
    let switch = RecordingSwitch::default();
    let platform = FakePlatform::default();
    let probe = FakeProbe::healthy();

    let device = DeviceBuilder::new(
        cfg,
        Collaborators {
            pins: Box::new(pins.clone()),
            presentation: Box::new(screen.clone()),
            encoder: Box::new(encoder.clone()),
            switch: Box::new(switch.clone()),
            platform: Box::new(platform.clone()),
            probe: probe.clone(),
            source: source.clone(),
        },
    )
    .with_clock(clock.clone())
    .build()
    .unwrap();
    let events = device.bus().subscribe();

    Rig {
        device,
        clock,
        pins,
        screen,
        encoder,
        switch,
        platform,
        probe,
        source,
        events,
    }
}

impl Rig {
    fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    fn state(&self) -> OperatingState {
        self.device.current_state()
    }

    /// One foreground tick; answers any ping it sent.
    async fn tick(&mut self) {
        let pings = self.probe.pings();
        self.device.on_foreground_tick().await;
        if self.probe.pings() > pings {
            self.device.on_external_event(ExternalEvent::Pong).await;
        }
    }

    /// Ticks every `TICK_MS` for `ms` of virtual time.
    async fn run_for(&mut self, ms: Millis) {
        let end = self.now() + ms;
        while self.now() < end {
            self.tick().await;
            tokio::time::sleep(Duration::from_millis(TICK_MS)).await;
        }
    }

    /// Press for 100 ms, release for 150 ms.
    async fn click(&mut self) {
        self.pins.press_button();
        self.run_for(100).await;
        self.pins.release_button();
        self.run_for(150).await;
    }

    fn drain(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(ev) => out.push(ev),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return out,
            }
        }
    }
}

fn kinds(events: &[Event], kind: EventKind) -> Vec<&Event> {
    events.iter().filter(|e| e.kind == kind).collect()
}

fn power_saving(screensaver: ScreensaverMode, deep_sleep: DeepSleepMode) -> DeviceConfig {
    DeviceConfig {
        screensaver,
        deep_sleep,
        activation_time_minutes: 1,
        ..DeviceConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn boots_into_the_single_channel_payment_screen() {
    let mut r = rig(DeviceConfig::default());
    r.device.start();
    r.tick().await;

    assert_eq!(r.state(), OperatingState::Ready);
    assert_eq!(r.screen.screens()[0], Screen::Boot);
    assert_eq!(
        r.screen.last(),
        Some(Screen::Payment {
            address: "lnurl-12".into()
        })
    );
    assert_eq!(r.encoder.queued(), vec!["lnurl-12".to_string()]);
    // ticker off: nothing consumes the data
    assert!(r.source.call_log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn link_recovery_leaves_the_overlay_and_forces_a_refresh() {
    let source = FakeSource::answering(0, 0);
    source.fail_everything();
    let cfg = DeviceConfig {
        ticker: TickerMode::Always,
        ..DeviceConfig::default()
    };
    let mut r = rig_with(cfg, source, false);
    r.device.start();
    r.run_for(1_000).await;
    assert_eq!(r.state(), OperatingState::BtcTicker);
    assert_eq!(r.source.call_log().len(), 2);

    r.probe.set_link(LinkState::Disconnected);
    r.run_for(5_000).await;
    assert_eq!(r.state(), OperatingState::ErrorRecoverable);
    assert_eq!(r.screen.last(), Some(Screen::Error(FaultKind::Link)));
    assert_eq!(r.device.health().errors.get(FaultKind::Link), 1);
    // link down: no fetch attempts
    assert_eq!(r.source.call_log().len(), 2);

    r.probe.set_link(LinkState::Connected);
    r.run_for(5_000).await;
    assert_eq!(r.state(), OperatingState::BtcTicker);
    // forced cycle well inside the 30 s backoff
    assert!(r.now() < 30_000);
    assert_eq!(r.source.call_log().len(), 4);
    assert!(matches!(r.screen.last(), Some(Screen::TickerValues(_))));

    let events = r.drain();
    let forced: Vec<_> = kinds(&events, EventKind::FetchStarted)
        .into_iter()
        .filter(|e| e.reason.as_deref() == Some("forced"))
        .collect();
    assert_eq!(forced.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn a_slow_sub_fetch_leaves_the_other_value_in_place() {
    let source = FakeSource::answering(0, 0);
    source.script_price(Reply::after(1_000, Ok(61_234)));
    source.script_height(Reply::after(10_000, Ok(870_001)));
    let cfg = DeviceConfig {
        ticker: TickerMode::Always,
        ..DeviceConfig::default()
    };
    let mut r = rig_with(cfg, source, false);
    r.device.start();
    r.tick().await;

    let snap = *r.device.external_data();
    assert_eq!(snap.price, DataValue::Available(61_234));
    assert_eq!(snap.block_height, DataValue::Unavailable);
    let stamp = snap.last_update_ms.unwrap();
    assert!((5_200..5_300).contains(&stamp), "stamped at {stamp}");
    assert_eq!(r.screen.last(), Some(Screen::TickerValues(snap)));
}

#[tokio::test(start_paused = true)]
async fn help_overlay_pauses_the_ticker_refresh() {
    let mut cfg = DeviceConfig {
        ticker: TickerMode::Always,
        ..DeviceConfig::default()
    };
    cfg.timings.fetch.interval_ms = 2_000;
    cfg.timings.fetch.backoff_ms = 1_000;
    let mut r = rig(cfg);
    r.device.start();
    r.tick().await;
    assert_eq!(r.state(), OperatingState::BtcTicker);
    assert_eq!(r.source.call_log().len(), 2);

    r.click().await;
    r.run_for(1_100).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);
    r.drain();

    // several intervals pass under the overlay
    r.run_for(7_000).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);
    assert!(kinds(&r.drain(), EventKind::FetchStarted).is_empty());

    r.run_for(3_000).await;
    assert_eq!(r.state(), OperatingState::BtcTicker);
    assert!(!kinds(&r.drain(), EventKind::FetchStarted).is_empty());
}

#[tokio::test(start_paused = true)]
async fn input_inside_the_wake_grace_is_swallowed() {
    let mut r = rig(power_saving(ScreensaverMode::Black, DeepSleepMode::Off));
    r.device.start();
    r.run_for(60_050).await;
    assert_eq!(r.state(), OperatingState::Screensaver);
    assert_eq!(r.screen.last(), Some(Screen::Screensaver(ScreensaverMode::Black)));

    // wakes only
    r.click().await;
    assert_eq!(r.state(), OperatingState::Ready);
    let woke_at = r.device.activity().last_wake_up_ms.unwrap();

    // 200 ms after the wake
    r.click().await;
    let events = r.drain();
    let reasons: Vec<_> = kinds(&events, EventKind::InputSuppressed)
        .iter()
        .filter_map(|e| e.reason.as_deref().map(str::to_string))
        .collect();
    assert_eq!(reasons, vec!["wake".to_string(), "grace".to_string()]);
    assert!(kinds(&events, EventKind::ScreensaverDismissed).len() == 1);

    // neither press may have started a gesture
    r.run_for(1_200).await;
    assert_eq!(r.state(), OperatingState::Ready);
    assert!(r.now() - woke_at > 1_000);

    r.click().await;
    r.run_for(1_100).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);
}

#[tokio::test(start_paused = true)]
async fn one_click_pages_through_help_and_returns() {
    let mut r = rig(DeviceConfig::default());
    r.device.start();
    r.click().await;
    r.run_for(1_100).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);
    assert_eq!(r.screen.last(), Some(Screen::HelpPage(1)));

    r.run_for(9_000).await;
    assert_eq!(r.state(), OperatingState::Ready);
    let screens = r.screen.screens();
    for page in 1..=3 {
        assert_eq!(
            screens.iter().filter(|s| **s == Screen::HelpPage(page)).count(),
            1,
            "page {page}"
        );
    }
    assert!(matches!(r.screen.last(), Some(Screen::Payment { .. })));
}

#[tokio::test(start_paused = true)]
async fn two_clicks_show_counters_then_legends() {
    let mut r = rig(DeviceConfig::default());
    r.device.start();
    r.click().await;
    r.click().await;
    r.run_for(1_100).await;
    assert_eq!(r.state(), OperatingState::ReportScreen);

    r.run_for(6_300 + 3 * 2_100).await;
    assert_eq!(r.state(), OperatingState::Ready);
    let screens = r.screen.screens();
    let legends: Vec<_> = screens
        .iter()
        .filter_map(|s| match s {
            Screen::ReportLegend(kind) => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(legends, FaultKind::ALL.to_vec());
}

#[tokio::test(start_paused = true)]
async fn config_mode_is_left_by_restart_after_the_guard() {
    let mut r = rig(DeviceConfig::default());
    r.device.start();
    for _ in 0..4 {
        r.click().await;
    }
    assert_eq!(r.state(), OperatingState::ConfigMode);
    assert_eq!(r.screen.last(), Some(Screen::Config));

    // inside the guard
    r.click().await;
    assert_eq!(r.state(), OperatingState::ConfigMode);
    assert_eq!(r.platform.restarts(), 0);

    r.run_for(2_000).await;
    r.click().await;
    assert_eq!(r.platform.restarts(), 1);
    assert_eq!(r.state(), OperatingState::Ready);
    assert_eq!(r.device.previous_state(), Some(OperatingState::Initializing));
    assert!(!r.device.restart_pending());
    let events = r.drain();
    assert_eq!(kinds(&events, EventKind::RestartRequested).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn touch_in_help_picks_config_or_report() {
    let mut r = rig_with(
        DeviceConfig::default(),
        FakeSource::answering(0, 0),
        true,
    );
    r.device.start();
    r.click().await;
    r.run_for(1_100).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);

    // touch-button strip
    r.pins.touch_at(100, BUTTON_STRIP_Y + 5);
    r.run_for(50).await;
    r.pins.lift_touch();
    r.run_for(200).await;
    assert_eq!(r.state(), OperatingState::ReportScreen);

    r.run_for(13_000).await;
    r.click().await;
    r.run_for(1_100).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);

    // main display area
    r.pins.touch_at(100, 100);
    r.run_for(50).await;
    r.pins.lift_touch();
    r.run_for(50).await;
    assert_eq!(r.state(), OperatingState::ConfigMode);
}

#[tokio::test(start_paused = true)]
async fn fault_during_help_waits_for_the_overlay_to_end() {
    let mut r = rig(DeviceConfig::default());
    r.device.start();
    r.click().await;
    r.run_for(1_100).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);

    r.probe.set_link(LinkState::Disconnected);
    r.run_for(4_000).await;
    assert_eq!(r.state(), OperatingState::HelpScreen);
    assert_eq!(r.device.shown_fault(), Some(FaultKind::Link));

    r.run_for(6_000).await;
    assert_eq!(r.state(), OperatingState::ErrorRecoverable);
    assert_eq!(r.screen.last(), Some(Screen::Error(FaultKind::Link)));
}

#[tokio::test(start_paused = true)]
async fn payment_switches_the_pin_and_returns() {
    let mut r = rig(DeviceConfig::default());
    r.device.start();
    r.device
        .on_external_event(ExternalEvent::PaymentReceived("12-1500".into()))
        .await;

    assert_eq!(
        r.switch.actuations(),
        vec![(12, Duration::from_millis(1_500))]
    );
    let screens = r.screen.screens();
    let n = screens.len();
    assert_eq!(screens[n - 3], Screen::SwitchedOn { pin: 12 });
    assert_eq!(screens[n - 2], Screen::ThankYou);
    assert!(matches!(screens[n - 1], Screen::Payment { .. }));

    let events = r.drain();
    let handled = kinds(&events, EventKind::PaymentHandled);
    assert_eq!(handled.len(), 1);
    assert_eq!(handled[0].pin, Some(12));
    assert_eq!(handled[0].delay_ms, Some(1_500));
}

#[tokio::test(start_paused = true)]
async fn special_mode_pulses_the_output() {
    let mut cfg = DeviceConfig::default();
    cfg.special.mode = SpecialMode::Pulse;
    let mut r = rig(cfg);
    r.device.start();
    r.tick().await;
    let waiting = Screen::SpecialPayment {
        address: "lnurl-12".into(),
        mode: SpecialMode::Pulse,
    };
    assert_eq!(r.screen.last(), Some(waiting.clone()));

    r.device
        .on_external_event(ExternalEvent::PaymentReceived("12-1000".into()))
        .await;

    // 2 Hz at 1:4
    assert_eq!(
        r.switch.actuations(),
        vec![(12, Duration::from_millis(100)), (12, Duration::from_millis(100))]
    );
    let screens = r.screen.screens();
    let n = screens.len();
    assert_eq!(
        screens[n - 3],
        Screen::SpecialSwitching {
            pin: 12,
            mode: SpecialMode::Pulse
        }
    );
    assert_eq!(screens[n - 2], Screen::ThankYou);
    assert_eq!(screens[n - 1], waiting);

    let events = r.drain();
    let handled = kinds(&events, EventKind::PaymentHandled);
    assert_eq!(handled[0].reason.as_deref(), Some("pulse"));
    assert_eq!(handled[0].delay_ms, Some(1_000));
}

#[tokio::test(start_paused = true)]
async fn malformed_payment_is_dropped() {
    let mut r = rig(DeviceConfig::default());
    r.device.start();
    r.device
        .on_external_event(ExternalEvent::PaymentReceived("twelve".into()))
        .await;

    assert!(r.switch.actuations().is_empty());
    let events = r.drain();
    assert_eq!(kinds(&events, EventKind::PaymentRejected).len(), 1);
    assert_eq!(r.state(), OperatingState::Ready);
}

#[tokio::test(start_paused = true)]
async fn navigation_cycles_products_and_the_ticker_returns() {
    let cfg = DeviceConfig {
        multi_channel: MultiChannelMode::Duo,
        ticker: TickerMode::Selecting,
        product_labels: vec!["Coffee".into()],
        ..DeviceConfig::default()
    };
    let mut r = rig(cfg);
    r.device.start();
    r.tick().await;
    assert_eq!(r.state(), OperatingState::ProductSelection);

    r.device.on_external_event(ExternalEvent::NavigateNext).await;
    assert_eq!(
        r.screen.last(),
        Some(Screen::Product {
            index: 1,
            label: "Coffee".into(),
            address: "lnurl-12".into()
        })
    );
    r.device.on_external_event(ExternalEvent::NavigateNext).await;
    assert_eq!(
        r.screen.last(),
        Some(Screen::Product {
            index: 2,
            label: "Pin 13".into(),
            address: "lnurl-13".into()
        })
    );
    r.device.on_external_event(ExternalEvent::NavigateNext).await;
    assert_eq!(r.state(), OperatingState::BtcTicker);

    r.run_for(10_100).await;
    assert_eq!(r.state(), OperatingState::ProductSelection);
}

#[tokio::test(start_paused = true)]
async fn fetched_labels_replace_the_configured_ones() {
    let source = FakeSource::answering(60_000, 870_000);
    source.set_labels(0, Ok(vec![SwitchLabel::new(13, "Tea")]));
    let cfg = DeviceConfig {
        multi_channel: MultiChannelMode::Duo,
        product_labels: vec!["Coffee".into(), "Water".into()],
        ..DeviceConfig::default()
    };
    let mut r = rig_with(cfg, source, false);
    r.device.start();
    r.tick().await;

    assert_eq!(r.state(), OperatingState::ProductSelection);
    assert_eq!(
        r.screen.last(),
        Some(Screen::ProductSelection {
            labels: vec!["Coffee".into(), "Tea".into()]
        })
    );
    let calls: Vec<_> = r.source.call_log().into_iter().map(|(name, _)| name).collect();
    assert_eq!(calls, vec!["labels"]);
    let events = r.drain();
    assert_eq!(kinds(&events, EventKind::LabelsUpdated).len(), 1);

    r.device.on_external_event(ExternalEvent::NavigateNext).await;
    r.device.on_external_event(ExternalEvent::NavigateNext).await;
    assert_eq!(
        r.screen.last(),
        Some(Screen::Product {
            index: 2,
            label: "Tea".into(),
            address: "lnurl-13".into()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn failed_label_fetch_is_retried_after_the_backoff() {
    let source = FakeSource::answering(60_000, 870_000);
    source.set_labels(0, Err(FetchError::Http { status: 503 }));
    let cfg = DeviceConfig {
        multi_channel: MultiChannelMode::Duo,
        ..DeviceConfig::default()
    };
    let mut r = rig_with(cfg, source, false);
    r.device.start();
    let label_calls = |r: &Rig| {
        r.source
            .call_log()
            .iter()
            .filter(|(name, _)| *name == "labels")
            .count()
    };

    r.run_for(29_000).await;
    assert_eq!(label_calls(&r), 1);
    assert_eq!(r.state(), OperatingState::ProductSelection);
    r.run_for(2_000).await;
    assert_eq!(label_calls(&r), 2);
}

#[tokio::test(start_paused = true)]
async fn freeze_is_aborted_while_the_wake_button_is_held() {
    let mut r = rig(power_saving(ScreensaverMode::Off, DeepSleepMode::Freeze));
    r.platform.set_wake_asserted(true);
    r.device.start();
    r.run_for(60_100).await;

    assert_eq!(r.platform.freezes(), 0);
    assert_eq!(r.state(), OperatingState::Ready);
    let events = r.drain();
    assert_eq!(kinds(&events, EventKind::SleepAborted).len(), 1);

    r.platform.set_wake_asserted(false);
    r.run_for(60_100).await;
    assert_eq!(r.platform.freezes(), 1);
    assert_eq!(r.platform.prepared(), 1);
    assert_eq!(r.platform.watchdog_disabled(), 1);
    // back through boot
    assert_eq!(r.state(), OperatingState::Ready);
}

#[tokio::test(start_paused = true)]
async fn the_press_that_ends_a_freeze_is_not_a_command() {
    let mut r = rig(power_saving(ScreensaverMode::Off, DeepSleepMode::Freeze));
    r.device.start();
    r.run_for(60_100).await;
    assert_eq!(r.platform.freezes(), 1);
    assert_eq!(r.state(), OperatingState::Ready);
    let woke_at = r.device.activity().last_wake_up_ms.unwrap();
    assert!(r.now() - woke_at < 1_000);

    // the wake press, still held while the device boots
    r.click().await;
    r.run_for(1_200).await;
    assert_eq!(r.state(), OperatingState::Ready);
    let events = r.drain();
    assert_eq!(kinds(&events, EventKind::Woke).len(), 1);
    let reasons: Vec<_> = kinds(&events, EventKind::InputSuppressed)
        .iter()
        .filter_map(|e| e.reason.as_deref().map(str::to_string))
        .collect();
    assert_eq!(reasons, vec!["grace".to_string()]);
    assert!(kinds(&events, EventKind::InputAction).is_empty());
}

#[tokio::test(start_paused = true)]
async fn light_sleep_resumes_with_a_grace_window() {
    let mut r = rig(power_saving(ScreensaverMode::Off, DeepSleepMode::Light));
    r.device.start();
    r.run_for(60_100).await;

    assert_eq!(r.platform.light_sleeps(), 1);
    assert_eq!(r.state(), OperatingState::Ready);
    assert_eq!(r.platform.backlight(), Some(true));
    assert!(r.device.activity().last_wake_up_ms.is_some());

    let events = r.drain();
    assert_eq!(kinds(&events, EventKind::SleepEntered).len(), 1);
    assert_eq!(kinds(&events, EventKind::Woke).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn backlight_screensaver_is_dismissed_by_a_payment() {
    let mut r = rig(power_saving(ScreensaverMode::Backlight, DeepSleepMode::Off));
    r.device.start();
    r.run_for(60_050).await;
    assert_eq!(r.platform.backlight(), Some(false));

    r.device
        .on_external_event(ExternalEvent::PaymentReceived("12-100".into()))
        .await;
    assert_eq!(r.platform.backlight(), Some(true));
    assert_eq!(r.state(), OperatingState::Ready);
    // no grace window after a payment
    assert!(r.device.activity().last_wake_up_ms.is_none());
}

#[tokio::test(start_paused = true)]
async fn run_stops_on_cancel_and_feeds_subscribers() {
    use crate::subscribers::Subscribe;
    use std::sync::Mutex;

    struct Collect(Mutex<Vec<EventKind>>);

    #[async_trait::async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    let collect = Arc::new(Collect(Mutex::new(Vec::new())));
    let device = DeviceBuilder::new(
        DeviceConfig::default(),
        Collaborators {
            pins: Box::new(ScriptedPins::new(false)),
            presentation: Box::new(RecordingPresentation::default()),
            encoder: Box::new(FakeEncoder::default()),
            switch: Box::new(RecordingSwitch::default()),
            platform: Box::new(FakePlatform::default()),
            probe: FakeProbe::healthy(),
            source: FakeSource::answering(1, 1),
        },
    )
    .with_subscribers(vec![collect.clone()])
    .build()
    .unwrap();

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let token = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn(device.run_with_events(rx, token.clone()));

    tx.send(ExternalEvent::PaymentReceived("13-10".into()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    token.cancel();
    handle.await.unwrap();

    let seen = collect.0.lock().unwrap().clone();
    assert!(seen.contains(&EventKind::StateChanged));
    assert!(seen.contains(&EventKind::PaymentHandled));
}
