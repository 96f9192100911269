//! GPIO adapter error types.

use garagedoor_domain::error::AdapterError;

/// Errors raised while acquiring the GPIO lines.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// The GPIO peripheral could not be opened.
    #[error("failed to open the GPIO peripheral")]
    Open(#[source] rppal::gpio::Error),

    /// A pin could not be claimed.
    #[error("failed to claim GPIO pin {pin}")]
    Pin {
        pin: u8,
        #[source]
        source: rppal::gpio::Error,
    },
}

impl From<GpioError> for AdapterError {
    fn from(err: GpioError) -> Self {
        Self::Io(Box::new(err))
    }
}
