//! External data: price and block height for the ticker screens, product
//! labels for the selection screens.
//!
//! ## Contents
//! - [`DataSource`] the async remote seam
//! - [`FetchCoordinator`] cadence gating, sequential sub-fetches, generation tagging
//! - [`ExternalDataSnapshot`], [`DataValue`] what the ticker screens read
//! - [`LabelSet`], [`SwitchLabel`] fetched product names
//!
//! ## Rules
//! - A cycle runs only while a ticker screen is shown and the link is up.
//! - Label and ticker attempts share one retry deadline.
//! - Sub-fetches never overlap; each has its own wait budget.
//! - A value that did not arrive is [`DataValue::Unavailable`], never an error state.

mod coordinator;
mod labels;
mod snapshot;
mod source;

pub use coordinator::FetchCoordinator;
pub use labels::{LabelSet, SwitchLabel};
pub use snapshot::{DataValue, ExternalDataSnapshot};
pub use source::DataSource;
