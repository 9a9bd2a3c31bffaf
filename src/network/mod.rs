//! Connectivity health: link, internet and payment-socket supervision.
//!
//! ## Contents
//! - [`LinkHealth`], [`FaultKind`], [`ErrorCounters`] the health record and its fault domains
//! - [`ConnectivityProbe`] the radio / HTTP / socket seam
//! - [`NetworkSupervisor`] periodic checks, reconnect rounds and keep-alive
//!
//! The supervisor is the only writer of [`LinkHealth`]; the device reads it
//! and folds [`HealthTransition`]s into the state machine.

mod health;
mod probe;
mod supervisor;

pub use health::{ErrorCounter, ErrorCounters, FaultKind, LinkHealth, LinkState};
pub use probe::ConnectivityProbe;
pub use supervisor::{HealthTransition, NetworkSupervisor};
