//! # garagedoor-adapter-gpio
//!
//! Binds the door to real Raspberry Pi GPIO lines through `rppal`.
//!
//! - the toggle line is an output, driven low as soon as it is claimed;
//! - the open and closed lines are inputs, asserted when they read high.
//!
//! The hardware cannot be put back into a known position, so
//! [`DoorAdapter::reset`] reports [`AdapterError::Unsupported`].
//!
//! ## Dependency rule
//!
//! Depends on `garagedoor-app` (port traits) and `garagedoor-domain` only.

mod config;
mod error;

pub use config::GpioConfig;
pub use error::GpioError;

use garagedoor_app::ports::DoorAdapter;
use garagedoor_domain::error::AdapterError;
use rppal::gpio::{Gpio, InputPin, OutputPin};

/// Door wired to three GPIO lines.
pub struct GpioDoor {
    toggle: OutputPin,
    open: InputPin,
    closed: InputPin,
}

impl GpioDoor {
    /// Open the GPIO peripheral and claim the configured pins.
    ///
    /// # Errors
    ///
    /// Returns [`GpioError`] if the peripheral is unavailable or a pin is
    /// already in use.
    pub fn new(config: &GpioConfig) -> Result<Self, GpioError> {
        let gpio = Gpio::new().map_err(GpioError::Open)?;
        let claim = |pin: u8| gpio.get(pin).map_err(|source| GpioError::Pin { pin, source });

        let toggle = claim(config.toggle_pin)?.into_output_low();
        let open = claim(config.open_pin)?.into_input();
        let closed = claim(config.closed_pin)?.into_input();

        tracing::info!(
            toggle_pin = config.toggle_pin,
            open_pin = config.open_pin,
            closed_pin = config.closed_pin,
            "GPIO door adapter ready"
        );
        Ok(Self {
            toggle,
            open,
            closed,
        })
    }
}

impl DoorAdapter for GpioDoor {
    fn set_toggle(&mut self, high: bool) -> Result<(), AdapterError> {
        if high {
            self.toggle.set_high();
        } else {
            self.toggle.set_low();
        }
        tracing::debug!(pin = self.toggle.pin(), high, "toggle line written");
        Ok(())
    }

    fn read_open_sensor(&mut self) -> Result<bool, AdapterError> {
        Ok(self.open.is_high())
    }

    fn read_closed_sensor(&mut self) -> Result<bool, AdapterError> {
        Ok(self.closed.is_high())
    }

    fn reset(&mut self) -> Result<(), AdapterError> {
        Err(AdapterError::Unsupported("reset"))
    }
}
