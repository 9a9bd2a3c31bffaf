use super::debounce::Level;

/// Touch controller reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchSample {
    Released,
    Pressed { x: u16, y: u16 },
}

/// Raw reads from the input peripherals.
///
/// Implementations read registers or GPIO; they never debounce.
pub trait InputPins: Send {
    /// Level of the external button line.
    fn button_level(&self) -> Level;

    /// Current touch reading, or `None` when no touch controller is fitted.
    fn touch_sample(&self) -> Option<TouchSample>;
}
