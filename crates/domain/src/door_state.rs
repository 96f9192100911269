//! Door state — the logical position of the door as seen by its sensors.

use serde::{Deserialize, Serialize};

/// Logical state of the door, derived from the "fully open" and
/// "fully closed" sensors.
///
/// [`Unknown`](Self::Unknown) is not an error: it is what the door reports
/// while moving, or when the sensors disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
    #[default]
    Unknown,
}

impl DoorState {
    /// Derive the state from the two sensor readings.
    ///
    /// Exactly one asserted sensor gives a definite state; both or neither
    /// asserted gives [`Unknown`](Self::Unknown).
    #[must_use]
    pub fn from_sensors(open: bool, closed: bool) -> Self {
        match (open, closed) {
            (true, false) => Self::Open,
            (false, true) => Self::Closed,
            _ => Self::Unknown,
        }
    }

    /// Human-readable lowercase name (`"open"`, `"closed"`, `"unknown"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the sensors agree on a definite position.
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for DoorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_open_when_only_open_sensor_is_asserted() {
        assert_eq!(DoorState::from_sensors(true, false), DoorState::Open);
    }

    #[test]
    fn should_be_closed_when_only_closed_sensor_is_asserted() {
        assert_eq!(DoorState::from_sensors(false, true), DoorState::Closed);
    }

    #[test]
    fn should_be_unknown_when_both_sensors_are_asserted() {
        assert_eq!(DoorState::from_sensors(true, true), DoorState::Unknown);
    }

    #[test]
    fn should_be_unknown_when_no_sensor_is_asserted() {
        assert_eq!(DoorState::from_sensors(false, false), DoorState::Unknown);
    }

    #[test]
    fn should_default_to_unknown() {
        assert_eq!(DoorState::default(), DoorState::Unknown);
        assert!(!DoorState::default().is_known());
    }

    #[test]
    fn should_display_lowercase_variant_name() {
        assert_eq!(DoorState::Open.to_string(), "open");
        assert_eq!(DoorState::Closed.to_string(), "closed");
        assert_eq!(DoorState::Unknown.to_string(), "unknown");
    }

    #[test]
    fn should_serialize_as_lowercase_string() {
        let json = serde_json::to_string(&DoorState::Closed).unwrap();
        assert_eq!(json, "\"closed\"");
        let parsed: DoorState = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(parsed, DoorState::Open);
    }
}
