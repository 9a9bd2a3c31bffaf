/// Chip-level power and reset control.
///
/// Sleep entry is split into small calls so the device can publish events and
/// render between them. `light_sleep` returns once a wake button fired;
/// `freeze` and `restart` normally never return on hardware, and a returning
/// implementation is treated as a cold boot.
pub trait Platform: Send {
    fn set_backlight(&mut self, on: bool);

    /// Quiesces peripherals (display, touch, card reader) before sleeping.
    fn prepare_for_sleep(&mut self);

    fn disable_watchdog(&mut self);

    /// Whether one of the wake buttons is asserted right now.
    fn wake_button_asserted(&self) -> bool;

    /// Pauses the CPU until a wake button fires.
    fn light_sleep(&mut self);

    /// Powers down everything but the always-on domain.
    fn freeze(&mut self);

    fn restart(&mut self);
}
