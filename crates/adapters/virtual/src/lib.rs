//! # garagedoor-adapter-virtual
//!
//! In-memory door that behaves like the real one, minus the motor delay.
//!
//! | Line | Initial | Behaviour |
//! |------|---------|-----------|
//! | toggle (output) | low | a rising edge flips both sensors |
//! | open sensor (input) | low | asserted while the door is open |
//! | closed sensor (input) | high | asserted while the door is closed |
//!
//! Holding the toggle high or driving it low has no effect on the sensors.
//! The simulator never fails and supports [`DoorAdapter::reset`].
//!
//! ## Dependency rule
//!
//! Depends on `garagedoor-app` (port traits) and `garagedoor-domain` only.

use garagedoor_app::ports::DoorAdapter;
use garagedoor_domain::error::AdapterError;

/// Simulated door. Pin numbers are only used to label log lines.
#[derive(Debug, Clone)]
pub struct VirtualDoor {
    toggle_pin: u8,
    open_pin: u8,
    closed_pin: u8,
    toggle: bool,
    open: bool,
    closed: bool,
}

impl Default for VirtualDoor {
    fn default() -> Self {
        Self::with_pins(0, 0, 0)
    }
}

impl VirtualDoor {
    /// Create a closed door whose log lines mention the given pin numbers.
    #[must_use]
    pub fn with_pins(toggle_pin: u8, open_pin: u8, closed_pin: u8) -> Self {
        tracing::info!(
            toggle_pin,
            open_pin,
            closed_pin,
            "creating virtual door adapter"
        );
        Self {
            toggle_pin,
            open_pin,
            closed_pin,
            toggle: false,
            open: false,
            closed: true,
        }
    }
}

impl DoorAdapter for VirtualDoor {
    fn set_toggle(&mut self, high: bool) -> Result<(), AdapterError> {
        tracing::debug!(pin = self.toggle_pin, high, "virtual door: write toggle");
        if high && !self.toggle {
            self.open = !self.open;
            self.closed = !self.closed;
            tracing::info!(
                open = self.open,
                closed = self.closed,
                "virtual door: moved"
            );
        }
        self.toggle = high;
        Ok(())
    }

    fn read_open_sensor(&mut self) -> Result<bool, AdapterError> {
        tracing::trace!(pin = self.open_pin, value = self.open, "virtual door: read open sensor");
        Ok(self.open)
    }

    fn read_closed_sensor(&mut self) -> Result<bool, AdapterError> {
        tracing::trace!(pin = self.closed_pin, value = self.closed, "virtual door: read closed sensor");
        Ok(self.closed)
    }

    fn reset(&mut self) -> Result<(), AdapterError> {
        tracing::info!("virtual door: reset to closed");
        self.toggle = false;
        self.open = false;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(door: &mut VirtualDoor) {
        door.set_toggle(true).unwrap();
        door.set_toggle(false).unwrap();
    }

    fn sensors(door: &mut VirtualDoor) -> (bool, bool) {
        (
            door.read_open_sensor().unwrap(),
            door.read_closed_sensor().unwrap(),
        )
    }

    #[test]
    fn should_start_closed() {
        let mut door = VirtualDoor::default();
        assert_eq!(sensors(&mut door), (false, true));
    }

    #[test]
    fn should_alternate_on_each_pulse() {
        let mut door = VirtualDoor::with_pins(17, 27, 22);
        pulse(&mut door);
        assert_eq!(sensors(&mut door), (true, false));
        pulse(&mut door);
        assert_eq!(sensors(&mut door), (false, true));
    }

    #[test]
    fn should_ignore_toggle_held_high() {
        let mut door = VirtualDoor::default();
        door.set_toggle(true).unwrap();
        door.set_toggle(true).unwrap();
        assert_eq!(sensors(&mut door), (true, false));
    }

    #[test]
    fn should_ignore_falling_edge() {
        let mut door = VirtualDoor::default();
        door.set_toggle(false).unwrap();
        assert_eq!(sensors(&mut door), (false, true));
        door.set_toggle(true).unwrap();
        door.set_toggle(false).unwrap();
        door.set_toggle(false).unwrap();
        assert_eq!(sensors(&mut door), (true, false));
    }

    #[test]
    fn should_return_to_closed_on_reset() {
        let mut door = VirtualDoor::default();
        pulse(&mut door);
        door.reset().unwrap();
        assert_eq!(sensors(&mut door), (false, true));
    }

    #[test]
    fn should_react_to_rising_edge_after_reset_while_high() {
        let mut door = VirtualDoor::default();
        door.set_toggle(true).unwrap();
        door.reset().unwrap();
        door.set_toggle(true).unwrap();
        assert_eq!(sensors(&mut door), (true, false));
    }
}
