//! Door adapter selected from the configured mode.

use garagedoor_adapter_gpio::{GpioConfig, GpioDoor, GpioError};
use garagedoor_adapter_virtual::VirtualDoor;
use garagedoor_app::ports::DoorAdapter;
use garagedoor_domain::error::AdapterError;

use crate::config::Mode;

/// Wrapper enum for the concrete door adapters.
pub enum Door {
    Virtual(VirtualDoor),
    Gpio(GpioDoor),
}

impl Door {
    /// Build the adapter for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`GpioError`] if the GPIO lines cannot be claimed in
    /// production mode.
    pub fn for_mode(mode: Mode, pins: &GpioConfig) -> Result<Self, GpioError> {
        match mode {
            Mode::Development => Ok(Self::Virtual(VirtualDoor::with_pins(
                pins.toggle_pin,
                pins.open_pin,
                pins.closed_pin,
            ))),
            Mode::Production => GpioDoor::new(pins).map(Self::Gpio),
        }
    }
}

impl DoorAdapter for Door {
    fn set_toggle(&mut self, high: bool) -> Result<(), AdapterError> {
        match self {
            Self::Virtual(door) => door.set_toggle(high),
            Self::Gpio(door) => door.set_toggle(high),
        }
    }

    fn read_open_sensor(&mut self) -> Result<bool, AdapterError> {
        match self {
            Self::Virtual(door) => door.read_open_sensor(),
            Self::Gpio(door) => door.read_open_sensor(),
        }
    }

    fn read_closed_sensor(&mut self) -> Result<bool, AdapterError> {
        match self {
            Self::Virtual(door) => door.read_closed_sensor(),
            Self::Gpio(door) => door.read_closed_sensor(),
        }
    }

    fn reset(&mut self) -> Result<(), AdapterError> {
        match self {
            Self::Virtual(door) => door.reset(),
            Self::Gpio(door) => door.reset(),
        }
    }
}
