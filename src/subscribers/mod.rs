//! # Event subscribers.
//!
//! The device publishes [`Event`](crate::events::Event)s on the
//! [`Bus`](crate::events::Bus); a listener spawned by `Device::run` hands each
//! one to the [`SubscriberSet`], which feeds every [`Subscribe`]r from its own
//! bounded queue.
//!
//! ```text
//! Bus ──► listener ──► SubscriberSet::emit ──► [queue] ──► LogWriter
//!                                          └─► [queue] ──► custom subscriber
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
