//! GPIO pin assignment.

use serde::Deserialize;

/// BCM pin numbers of the three door lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpioConfig {
    /// Output driving the toggle relay.
    pub toggle_pin: u8,
    /// Input asserted while the door is fully open.
    pub open_pin: u8,
    /// Input asserted while the door is fully closed.
    pub closed_pin: u8,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            toggle_pin: 17,
            open_pin: 27,
            closed_pin: 22,
        }
    }
}

impl GpioConfig {
    /// Whether the three lines use three different pins.
    #[must_use]
    pub fn has_distinct_pins(&self) -> bool {
        self.toggle_pin != self.open_pin
            && self.toggle_pin != self.closed_pin
            && self.open_pin != self.closed_pin
    }
}
