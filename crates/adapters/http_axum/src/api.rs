//! Door API handlers and their JSON bodies.

pub mod door;
pub mod health;
pub mod ws;

use serde::{Deserialize, Serialize};

use garagedoor_domain::door_state::DoorState;

/// `{"result": ...}`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimpleResponse {
    pub result: String,
}

impl SimpleResponse {
    /// `{"result":"ok"}`
    #[must_use]
    pub fn ok() -> Self {
        Self {
            result: "ok".to_string(),
        }
    }
}

/// `{"result":"ok","state":"open|closed|unknown"}`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateResponse {
    pub result: String,
    pub state: DoorState,
}

impl StateResponse {
    #[must_use]
    pub fn ok(state: DoorState) -> Self {
        Self {
            result: "ok".to_string(),
            state,
        }
    }
}

/// `{"result":"nok","message":...}`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub result: String,
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn nok(message: impl Into<String>) -> Self {
        Self {
            result: "nok".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_state_response() {
        let json = serde_json::to_string(&StateResponse::ok(DoorState::Open)).unwrap();
        assert_eq!(json, r#"{"result":"ok","state":"open"}"#);
    }

    #[test]
    fn should_serialize_error_response() {
        let json = serde_json::to_string(&ErrorResponse::nok("Unauthorized")).unwrap();
        assert_eq!(json, r#"{"result":"nok","message":"Unauthorized"}"#);
    }
}
