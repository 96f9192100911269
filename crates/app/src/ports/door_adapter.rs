//! Door adapter port — the physical I/O behind one door.

use garagedoor_domain::error::AdapterError;

/// Physical I/O for a single door: one toggle output, two end-stop inputs.
///
/// The controller owns its adapter exclusively and never calls it from two
/// tasks at once, so every operation takes `&mut self`.
pub trait DoorAdapter: Send {
    /// Drive the toggle output high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Io`] when the output cannot be driven.
    fn set_toggle(&mut self, high: bool) -> Result<(), AdapterError>;

    /// Whether the "fully open" sensor is asserted.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Io`] when the input cannot be read.
    fn read_open_sensor(&mut self) -> Result<bool, AdapterError>;

    /// Whether the "fully closed" sensor is asserted.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Io`] when the input cannot be read.
    fn read_closed_sensor(&mut self) -> Result<bool, AdapterError>;

    /// Return to the canonical closed position.
    ///
    /// Only simulated doors can do this.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unsupported`] on real hardware.
    fn reset(&mut self) -> Result<(), AdapterError>;
}
