//! Power saving: idle tracking, screensaver and deep-sleep arbitration, wake
//! grace.
//!
//! The [`PowerScheduler`] only decides; the device carries the decision out
//! through the [`Platform`] seam and reports back.
//!
//! ```text
//! activity pulses ─► PowerScheduler::tick(now) ─► PowerRequest
//!                                                  ├─ Screensaver(black|backlight) ─► render / backlight
//!                                                  └─ Sleep(light|freeze)          ─► Platform
//! ```

mod platform;
mod scheduler;

pub use platform::Platform;
pub use scheduler::{ActivitySnapshot, Admission, PowerRequest, PowerScheduler};
