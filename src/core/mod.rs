//! Runtime core: the device context and its construction.
//!
//! The only public API from this module is [`Device`] (built with
//! [`DeviceBuilder`] from a [`DeviceConfig`](crate::DeviceConfig) and its
//! [`Collaborators`]) and the [`ExternalEvent`]s it accepts.
//!
//! Internal modules:
//! - [`device`]: the foreground tick, overlays, payments and power requests;
//! - [`builder`]: validates the config and wires the components.

mod builder;
mod device;

#[cfg(test)]
mod scenarios;

pub use builder::{Collaborators, DeviceBuilder};
pub use device::{Device, ExternalEvent};
