//! Error types used by switchcore.
//!
//! - [`ConfigError`]: a device configuration that cannot be used.
//! - [`FetchError`]: one external-data sub-fetch failed.
//! - [`PaymentError`]: a payment notification that does not actuate anything.
//!
//! All of them provide `as_label` (stable snake_case, for logs) and
//! `as_message`. None of them is fatal to the foreground loop: connectivity
//! and fetch faults are retried, payment faults are logged and dropped.

use thiserror::Error;

/// # Errors produced while loading or validating a [`DeviceConfig`](crate::DeviceConfig).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Screensaver and deep sleep were both enabled.
    #[error("screensaver '{screensaver}' and deep sleep '{deep_sleep}' are mutually exclusive")]
    PowerModeConflict {
        screensaver: &'static str,
        deep_sleep: &'static str,
    },

    /// The TOML document could not be parsed.
    #[error("config parse failed: {reason}")]
    Parse { reason: String },

    /// A product label or switch pin refers to a product the mode does not have.
    #[error("product {index} is out of range for {count} products")]
    UnknownProduct { index: usize, count: usize },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use switchcore::ConfigError;
    ///
    /// let err = ConfigError::UnknownProduct { index: 3, count: 2 };
    /// assert_eq!(err.as_label(), "config_unknown_product");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::PowerModeConflict { .. } => "config_power_mode_conflict",
            ConfigError::Parse { .. } => "config_parse",
            ConfigError::UnknownProduct { .. } => "config_unknown_product",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigError::PowerModeConflict {
                screensaver,
                deep_sleep,
            } => format!("power modes conflict: screensaver={screensaver} deep_sleep={deep_sleep}"),
            ConfigError::Parse { reason } => format!("parse: {reason}"),
            ConfigError::UnknownProduct { index, count } => {
                format!("product {index} not in 1..={count}")
            }
        }
    }
}

/// # Errors produced by one external-data sub-fetch.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No result arrived within the sub-fetch wait budget.
    #[error("no result within {budget_ms}ms")]
    Timeout { budget_ms: u64 },

    /// The data source answered with a non-success status.
    #[error("http status {status}")]
    Http { status: u16 },

    /// The response body could not be interpreted.
    #[error("unparseable response: {reason}")]
    Parse { reason: String },

    /// The result channel closed before a result was delivered.
    #[error("result channel closed")]
    ChannelClosed,
}

impl FetchError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "fetch_timeout",
            FetchError::Http { .. } => "fetch_http",
            FetchError::Parse { .. } => "fetch_parse",
            FetchError::ChannelClosed => "fetch_channel_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FetchError::Timeout { budget_ms } => format!("timeout: {budget_ms}ms"),
            FetchError::Http { status } => format!("status: {status}"),
            FetchError::Parse { reason } => format!("parse: {reason}"),
            FetchError::ChannelClosed => "channel closed".to_string(),
        }
    }

    /// Indicates whether the next fetch window may succeed.
    ///
    /// Server-side errors and timeouts are retryable; a 4xx answer or an
    /// unparseable body will not fix itself.
    ///
    /// # Example
    /// ```
    /// use switchcore::FetchError;
    ///
    /// assert!(FetchError::Http { status: 503 }.is_retryable());
    /// assert!(!FetchError::Http { status: 404 }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::ChannelClosed => true,
            FetchError::Http { status } => *status >= 500 || *status == 429,
            FetchError::Parse { .. } => false,
        }
    }
}

/// # Errors produced while interpreting a payment notification.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The payload does not have the expected shape.
    #[error("malformed payment payload '{payload}'")]
    MalformedPayload { payload: String },

    /// A threshold payment arrived below the configured amount.
    #[error("paid {paid_sats} sat, threshold is {threshold_sats} sat")]
    BelowThreshold { paid_sats: u64, threshold_sats: u64 },
}

impl PaymentError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PaymentError::MalformedPayload { .. } => "payment_malformed",
            PaymentError::BelowThreshold { .. } => "payment_below_threshold",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PaymentError::MalformedPayload { payload } => format!("malformed: {payload:?}"),
            PaymentError::BelowThreshold {
                paid_sats,
                threshold_sats,
            } => format!("below threshold: {paid_sats} < {threshold_sats}"),
        }
    }
}
