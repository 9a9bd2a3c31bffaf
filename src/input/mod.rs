//! Input recognition: raw levels from the external button and the touch
//! surface become clean press and action events.
//!
//! ## Contents
//! - `Debouncer` stable edges from a noisy level
//! - [`ClickRecognizer`] click counting, hold detection, action dispatch
//! - [`ActionTable`] static `(source, clicks, trigger) -> Action` rules
//! - [`InputPins`] the peripheral-driver seam the foreground loop samples

mod debounce;
mod pins;
mod recognizer;
mod table;

pub use debounce::Level;
pub use pins::{InputPins, TouchSample};
pub use recognizer::{ClickRecognizer, ClickSequenceState, InputEvent};
pub use table::{Action, ActionTable, HoldTier, InputSource, Rule, Trigger};
