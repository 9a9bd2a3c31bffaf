//! Recording fakes for every collaborator, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::clock::Millis;
use crate::device::{AddressEncoder, Presentation, Screen, Switch};
use crate::error::FetchError;
use crate::fetch::{DataSource, SwitchLabel};
use crate::input::{InputPins, Level, TouchSample};
use crate::network::{ConnectivityProbe, LinkState};
use crate::power::Platform;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap()
}

// ---- connectivity ----

struct ProbeState {
    link: LinkState,
    socket: bool,
    http: Option<u16>,
    http_delay: Duration,
    tcp: bool,
    http_calls: u32,
    pings: u32,
    socket_disconnects: u32,
    socket_reconnects: u32,
    link_reconnects: u32,
}

pub struct FakeProbe {
    state: Mutex<ProbeState>,
}

impl FakeProbe {
    /// Link up, internet reachable, socket connected.
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ProbeState {
                link: LinkState::Connected,
                socket: true,
                http: Some(204),
                http_delay: Duration::ZERO,
                tcp: true,
                http_calls: 0,
                pings: 0,
                socket_disconnects: 0,
                socket_reconnects: 0,
                link_reconnects: 0,
            }),
        })
    }

    pub fn set_link(&self, link: LinkState) {
        lock(&self.state).link = link;
    }
    pub fn set_socket(&self, connected: bool) {
        lock(&self.state).socket = connected;
    }
    pub fn set_http(&self, status: Option<u16>) {
        lock(&self.state).http = status;
    }
    pub fn set_http_delay(&self, delay: Duration) {
        lock(&self.state).http_delay = delay;
    }
    pub fn set_tcp(&self, ok: bool) {
        lock(&self.state).tcp = ok;
    }
    pub fn http_calls(&self) -> u32 {
        lock(&self.state).http_calls
    }
    pub fn pings(&self) -> u32 {
        lock(&self.state).pings
    }
    pub fn socket_disconnects(&self) -> u32 {
        lock(&self.state).socket_disconnects
    }
    pub fn socket_reconnects(&self) -> u32 {
        lock(&self.state).socket_reconnects
    }
    pub fn link_reconnects(&self) -> u32 {
        lock(&self.state).link_reconnects
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    fn link_status(&self) -> LinkState {
        lock(&self.state).link
    }
    fn socket_is_connected(&self) -> bool {
        lock(&self.state).socket
    }
    fn send_ping(&self) {
        lock(&self.state).pings += 1;
    }
    async fn http_probe(&self, _url: &str, _timeout: Duration) -> Option<u16> {
        let (delay, status) = {
            let mut s = lock(&self.state);
            s.http_calls += 1;
            (s.http_delay, s.http)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        status
    }
    async fn tcp_probe(&self, _host: &str, _port: u16, _timeout: Duration) -> bool {
        lock(&self.state).tcp
    }
    fn disconnect_socket(&self) {
        let mut s = lock(&self.state);
        s.socket_disconnects += 1;
        s.socket = false;
    }
    fn reconnect_socket(&self) {
        lock(&self.state).socket_reconnects += 1;
    }
    fn begin_link_reconnect(&self) {
        lock(&self.state).link_reconnects += 1;
    }
}

// ---- data source ----

/// One scripted answer: wait `delay`, then return `result`.
#[derive(Clone, Debug)]
pub struct Reply {
    pub delay: Duration,
    pub result: Result<u64, FetchError>,
}

impl Reply {
    pub fn after(delay_ms: Millis, result: Result<u64, FetchError>) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            result,
        }
    }
}

struct Script {
    queue: VecDeque<Reply>,
    fallback: Reply,
}

impl Script {
    fn next(&mut self) -> Reply {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct FakeSource {
    origin: Instant,
    price: Mutex<Script>,
    height: Mutex<Script>,
    labels: Mutex<(Duration, Result<Vec<SwitchLabel>, FetchError>)>,
    calls: Mutex<Vec<(&'static str, Millis)>>,
}

impl FakeSource {
    /// Answers at once with these values unless scripted otherwise.
    pub fn answering(price: u64, height: u64) -> Arc<Self> {
        let script = |v| {
            Mutex::new(Script {
                queue: VecDeque::new(),
                fallback: Reply::after(0, Ok(v)),
            })
        };
        Arc::new(Self {
            origin: Instant::now(),
            price: script(price),
            height: script(height),
            labels: Mutex::new((Duration::ZERO, Ok(Vec::new()))),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn script_price(&self, reply: Reply) {
        lock(&self.price).queue.push_back(reply);
    }
    pub fn script_height(&self, reply: Reply) {
        lock(&self.height).queue.push_back(reply);
    }
    /// Every label fetch answers with `result` after `delay_ms`.
    pub fn set_labels(&self, delay_ms: Millis, result: Result<Vec<SwitchLabel>, FetchError>) {
        *lock(&self.labels) = (Duration::from_millis(delay_ms), result);
    }
    pub fn fail_everything(&self) {
        lock(&self.price).fallback = Reply::after(0, Err(FetchError::Http { status: 503 }));
        lock(&self.height).fallback = Reply::after(0, Err(FetchError::Http { status: 503 }));
    }
    /// `(sub-fetch, started at ms)` in call order.
    pub fn call_log(&self) -> Vec<(&'static str, Millis)> {
        lock(&self.calls).clone()
    }

    async fn answer(&self, name: &'static str, script: &Mutex<Script>) -> Result<u64, FetchError> {
        lock(&self.calls).push((name, self.origin.elapsed().as_millis() as Millis));
        let reply = lock(script).next();
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch_price(&self) -> Result<u64, FetchError> {
        self.answer("price", &self.price).await
    }
    async fn fetch_block_height(&self) -> Result<u64, FetchError> {
        self.answer("block_height", &self.height).await
    }
    async fn fetch_labels(&self) -> Result<Vec<SwitchLabel>, FetchError> {
        lock(&self.calls).push(("labels", self.origin.elapsed().as_millis() as Millis));
        let (delay, result) = lock(&self.labels).clone();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

// ---- peripherals ----

struct PinState {
    button: Level,
    touch: Option<TouchSample>,
}

/// Input lines the test drives by hand. Clones share state.
#[derive(Clone)]
pub struct ScriptedPins(Arc<Mutex<PinState>>);

impl ScriptedPins {
    pub fn new(touch_fitted: bool) -> Self {
        Self(Arc::new(Mutex::new(PinState {
            button: Level::High,
            touch: touch_fitted.then_some(TouchSample::Released),
        })))
    }
    pub fn press_button(&self) {
        lock(&self.0).button = Level::Low;
    }
    pub fn release_button(&self) {
        lock(&self.0).button = Level::High;
    }
    pub fn touch_at(&self, x: u16, y: u16) {
        lock(&self.0).touch = Some(TouchSample::Pressed { x, y });
    }
    pub fn lift_touch(&self) {
        lock(&self.0).touch = Some(TouchSample::Released);
    }
}

impl InputPins for ScriptedPins {
    fn button_level(&self) -> Level {
        lock(&self.0).button
    }
    fn touch_sample(&self) -> Option<TouchSample> {
        lock(&self.0).touch
    }
}

/// Touches with `y` above this are in the touch-button strip.
pub const BUTTON_STRIP_Y: u16 = 305;

/// Records every render request. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingPresentation(Arc<Mutex<Vec<Screen>>>);

impl RecordingPresentation {
    pub fn screens(&self) -> Vec<Screen> {
        lock(&self.0).clone()
    }
    pub fn last(&self) -> Option<Screen> {
        lock(&self.0).last().cloned()
    }
}

impl Presentation for RecordingPresentation {
    fn render(&mut self, screen: Screen) {
        lock(&self.0).push(screen);
    }
    fn is_within_primary_area(&self, _x: u16, y: u16) -> bool {
        y <= BUTTON_STRIP_Y
    }
}

#[derive(Clone, Default)]
pub struct FakeEncoder(Arc<Mutex<Vec<String>>>);

impl FakeEncoder {
    pub fn queued(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

impl AddressEncoder for FakeEncoder {
    fn generate_address(&self, channel: u8) -> String {
        format!("lnurl-{channel}")
    }
    fn apply_to_display_queue(&mut self, address: &str) {
        lock(&self.0).push(address.to_string());
    }
}

/// Records actuations and holds the output for the requested time.
#[derive(Clone, Default)]
pub struct RecordingSwitch(Arc<Mutex<Vec<(u8, Duration)>>>);

impl RecordingSwitch {
    pub fn actuations(&self) -> Vec<(u8, Duration)> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl Switch for RecordingSwitch {
    async fn actuate(&mut self, pin: u8, duration: Duration) {
        lock(&self.0).push((pin, duration));
        tokio::time::sleep(duration).await;
    }
}

#[derive(Default)]
struct PlatformState {
    backlight: Option<bool>,
    prepared: u32,
    watchdog_disabled: u32,
    wake_asserted: bool,
    light_sleeps: u32,
    freezes: u32,
    restarts: u32,
}

/// Platform whose sleep calls return at once. Clones share state.
#[derive(Clone, Default)]
pub struct FakePlatform(Arc<Mutex<PlatformState>>);

impl FakePlatform {
    pub fn set_wake_asserted(&self, asserted: bool) {
        lock(&self.0).wake_asserted = asserted;
    }
    pub fn backlight(&self) -> Option<bool> {
        lock(&self.0).backlight
    }
    pub fn light_sleeps(&self) -> u32 {
        lock(&self.0).light_sleeps
    }
    pub fn freezes(&self) -> u32 {
        lock(&self.0).freezes
    }
    pub fn restarts(&self) -> u32 {
        lock(&self.0).restarts
    }
    pub fn prepared(&self) -> u32 {
        lock(&self.0).prepared
    }
    pub fn watchdog_disabled(&self) -> u32 {
        lock(&self.0).watchdog_disabled
    }
}

impl Platform for FakePlatform {
    fn set_backlight(&mut self, on: bool) {
        lock(&self.0).backlight = Some(on);
    }
    fn prepare_for_sleep(&mut self) {
        lock(&self.0).prepared += 1;
    }
    fn disable_watchdog(&mut self) {
        lock(&self.0).watchdog_disabled += 1;
    }
    fn wake_button_asserted(&self) -> bool {
        lock(&self.0).wake_asserted
    }
    fn light_sleep(&mut self) {
        lock(&self.0).light_sleeps += 1;
    }
    fn freeze(&mut self) {
        lock(&self.0).freezes += 1;
    }
    fn restart(&mut self) {
        lock(&self.0).restarts += 1;
    }
}
