//! Payment notifications from the socket, turned into switch actuations.

use serde::Deserialize;

use crate::clock::Millis;
use crate::config::DeviceConfig;
use crate::error::PaymentError;

/// Which output to switch and for how long.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actuation {
    pub pin: u8,
    pub duration_ms: Millis,
}

/// Threshold-mode notification body; only the paid amount is read.
#[derive(Deserialize)]
struct Notification {
    payment: PaidAmount,
}

#[derive(Deserialize)]
struct PaidAmount {
    /// Millisatoshi.
    amount: u64,
}

/// Interprets a payment payload under the current configuration.
///
/// Normal mode expects `"<pin>-<durationMs>"`. Threshold mode expects a JSON
/// notification carrying the paid amount in millisatoshi at
/// `payment.amount` (`{"payment":{"amount":21000,...}}`).
pub fn parse_payment(payload: &str, cfg: &DeviceConfig) -> Result<Actuation, PaymentError> {
    let malformed = || PaymentError::MalformedPayload {
        payload: payload.to_string(),
    };

    let Some(threshold) = &cfg.threshold else {
        let (pin, duration) = payload.trim().split_once('-').ok_or_else(malformed)?;
        return Ok(Actuation {
            pin: pin.trim().parse().map_err(|_| malformed())?,
            duration_ms: duration.trim().parse().map_err(|_| malformed())?,
        });
    };

    let notification: Notification = serde_json::from_str(payload).map_err(|_| malformed())?;
    let paid_sats = notification.payment.amount / 1_000;
    if paid_sats < threshold.amount_sats {
        return Err(PaymentError::BelowThreshold {
            paid_sats,
            threshold_sats: threshold.amount_sats,
        });
    }
    Ok(Actuation {
        pin: threshold.pin,
        duration_ms: threshold.duration_ms,
    })
}
