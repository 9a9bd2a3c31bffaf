//! # Example: Simulated Terminal
//!
//! Runs the device core against console stand-ins for every collaborator:
//! screens are printed, the switch sleeps, the network is always healthy and
//! the price source returns fixed values.
//!
//! A scripted operator browses the products, pays for product 2 and leaves.
//!
//! ```text
//! RUST_LOG=switchcore=debug cargo run --example simulated_terminal
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use switchcore::{
    AddressEncoder, Collaborators, ConnectivityProbe, DataSource, DeviceBuilder, DeviceConfig,
    ExternalEvent, FetchError, InputPins, Level, LinkState, LogWriter, Platform, Presentation,
    Screen, Subscribe, Switch, SwitchLabel, TouchSample,
};

struct Console;

impl Presentation for Console {
    fn render(&mut self, screen: Screen) {
        println!("[screen] {screen:?}");
    }
    fn is_within_primary_area(&self, _x: u16, y: u16) -> bool {
        y <= 305
    }
}

struct Lnurl;

impl AddressEncoder for Lnurl {
    fn generate_address(&self, channel: u8) -> String {
        format!("lnurl1dp68gurn8ghj7pin{channel}")
    }
    fn apply_to_display_queue(&mut self, address: &str) {
        println!("[qr] {address}");
    }
}

struct Relay;

#[async_trait]
impl Switch for Relay {
    async fn actuate(&mut self, pin: u8, duration: Duration) {
        println!("[relay] pin {pin} on for {duration:?}");
        tokio::time::sleep(duration).await;
        println!("[relay] pin {pin} off");
    }
}

/// Button never pressed, no touch controller fitted.
struct IdlePins;

impl InputPins for IdlePins {
    fn button_level(&self) -> Level {
        Level::High
    }
    fn touch_sample(&self) -> Option<TouchSample> {
        None
    }
}

struct Board;

impl Platform for Board {
    fn set_backlight(&mut self, on: bool) {
        println!("[board] backlight {}", if on { "on" } else { "off" });
    }
    fn prepare_for_sleep(&mut self) {}
    fn disable_watchdog(&mut self) {}
    fn wake_button_asserted(&self) -> bool {
        false
    }
    fn light_sleep(&mut self) {}
    fn freeze(&mut self) {}
    fn restart(&mut self) {
        println!("[board] restart");
    }
}

struct AlwaysOnline;

#[async_trait]
impl ConnectivityProbe for AlwaysOnline {
    fn link_status(&self) -> LinkState {
        LinkState::Connected
    }
    fn socket_is_connected(&self) -> bool {
        true
    }
    fn send_ping(&self) {}
    async fn http_probe(&self, _url: &str, _timeout: Duration) -> Option<u16> {
        Some(204)
    }
    async fn tcp_probe(&self, _host: &str, _port: u16, _timeout: Duration) -> bool {
        true
    }
    fn disconnect_socket(&self) {}
    fn reconnect_socket(&self) {}
    fn begin_link_reconnect(&self) {}
}

struct FixedPrices;

#[async_trait]
impl DataSource for FixedPrices {
    async fn fetch_price(&self) -> Result<u64, FetchError> {
        tokio::time::sleep(Duration::from_millis(120)).await;
        Ok(61_250)
    }
    async fn fetch_block_height(&self) -> Result<u64, FetchError> {
        tokio::time::sleep(Duration::from_millis(80)).await;
        Ok(871_442)
    }
    async fn fetch_labels(&self) -> Result<Vec<SwitchLabel>, FetchError> {
        Ok(vec![SwitchLabel::new(13, "Flat White")])
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchcore=info".into()),
        )
        .init();

    let cfg = DeviceConfig::from_toml_str(
        r#"
        multi_channel = "duo"
        ticker = "selecting"
        product_labels = ["Espresso", "Cappuccino"]

        [timings.display]
        thank_you_ms = 500
        "#,
    )?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let device = DeviceBuilder::new(
        cfg,
        Collaborators {
            pins: Box::new(IdlePins),
            presentation: Box::new(Console),
            encoder: Box::new(Lnurl),
            switch: Box::new(Relay),
            platform: Box::new(Board),
            probe: Arc::new(AlwaysOnline),
            source: Arc::new(FixedPrices),
        },
    )
    .with_subscribers(subs)
    .build()?;

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let token = CancellationToken::new();
    let handle = tokio::spawn(device.run_with_events(rx, token.clone()));

    let script = [
        (500, ExternalEvent::NavigateNext),
        (800, ExternalEvent::NavigateNext),
        (600, ExternalEvent::PaymentReceived("13-1500".into())),
        (3_000, ExternalEvent::NavigateNext),
    ];
    for (pause_ms, event) in script {
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
        println!("[operator] {event:?}");
        tx.send(event).await?;
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();
    handle.await?;
    Ok(())
}
