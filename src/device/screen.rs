//! What the core asks the display to show, and the collaborators it drives.

use std::time::Duration;

use async_trait::async_trait;

use crate::clock::Millis;
use crate::config::{PulsePattern, ScreensaverMode, SpecialMode};
use crate::fetch::ExternalDataSnapshot;
use crate::network::{ErrorCounters, FaultKind};

/// One render request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Boot,
    Payment { address: String },
    ThresholdPayment { address: String, amount_sats: u64 },
    /// Payment screen announcing pulsed switching.
    SpecialPayment { address: String, mode: SpecialMode },
    ProductSelection { labels: Vec<String> },
    /// `index` is 1-based.
    Product { index: u8, label: String, address: String },
    Ticker(ExternalDataSnapshot),
    /// Redraw only the values of a ticker already on screen.
    TickerValues(ExternalDataSnapshot),
    Error(FaultKind),
    Config,
    /// 1-based page number.
    HelpPage(u8),
    Report(ErrorCounters),
    /// Legend page explaining one counter.
    ReportLegend(FaultKind),
    Screensaver(ScreensaverMode),
    SwitchedOn { pin: u8 },
    /// Shown while `pin` is pulsed.
    SpecialSwitching { pin: u8, mode: SpecialMode },
    ThankYou,
}

/// Display collaborator.
pub trait Presentation: Send {
    fn render(&mut self, screen: Screen);

    /// Whether a touch at `(x, y)` lies in the primary (config) area.
    fn is_within_primary_area(&self, x: u16, y: u16) -> bool;
}

/// Payment-request encoder.
pub trait AddressEncoder: Send {
    /// Payment request for the given switch output.
    fn generate_address(&self, channel: u8) -> String;

    fn apply_to_display_queue(&mut self, address: &str);
}

/// Relay output driver.
#[async_trait]
pub trait Switch: Send {
    /// Drives `pin` high for `duration`, then low again.
    async fn actuate(&mut self, pin: u8, duration: Duration);

    /// Toggles `pin` by `pattern` for `duration`, ending low. The last
    /// period is cut short at the end of `duration`.
    async fn pulse(&mut self, pin: u8, pattern: PulsePattern, duration: Duration) {
        let total = duration.as_millis() as Millis;
        if pattern.on_ms == 0 || pattern.period_ms() == 0 {
            return self.actuate(pin, duration).await;
        }
        let mut spent: Millis = 0;
        while spent < total {
            let on = pattern.on_ms.min(total - spent);
            self.actuate(pin, Duration::from_millis(on)).await;
            spent += on;
            let off = pattern.off_ms.min(total - spent);
            if off > 0 {
                tokio::time::sleep(Duration::from_millis(off)).await;
            }
            spent += off;
        }
    }
}
