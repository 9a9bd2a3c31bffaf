//! Operating modes, screen decisions and the display-side collaborators.
//!
//! ## Contents
//! - [`OperatingState`], [`StateMachine`] the single current mode and its transition table
//! - [`decide`], [`navigate_next`] pure payment-screen policy
//! - [`parse_payment`] payment payload interpretation
//! - [`Screen`], [`Presentation`], [`AddressEncoder`], [`Switch`] what the core draws and drives

mod machine;
mod payment;
mod policy;
mod screen;
mod state;

pub use machine::{FaultUpdate, StateMachine};
pub use payment::parse_payment;
pub use policy::{NavigationState, PaymentScreen, decide, idle_return, navigate_next};
pub use screen::{AddressEncoder, Presentation, Screen, Switch};
pub use state::OperatingState;
