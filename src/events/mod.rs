//! Device events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish device events from the state machine, the network supervisor and
//! the fetch coordinator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Device`, `StateMachine`, `NetworkSupervisor`,
//!   `FetchCoordinator`.
//! - **Consumers**: the listener spawned by `Device::run`, which fans out to
//!   the `SubscriberSet`. Tests subscribe directly.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
