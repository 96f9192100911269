//! Home Assistant MQTT discovery payload for the cover.

use serde::Serialize;

use crate::topics::Topics;

/// Body published (retained) on the discovery topic.
#[derive(Debug, Serialize)]
pub struct DiscoveryPayload {
    pub name: &'static str,
    pub device_class: &'static str,
    pub command_topic: String,
    pub state_topic: String,
    pub payload_open: &'static str,
    pub payload_close: &'static str,
    pub payload_stop: &'static str,
    pub state_open: &'static str,
    pub state_closed: &'static str,
    pub unique_id: String,
    pub device: DiscoveryDevice,
}

/// Device block of the discovery payload.
#[derive(Debug, Serialize)]
pub struct DiscoveryDevice {
    pub identifiers: String,
    pub name: &'static str,
    pub model: &'static str,
    pub manufacturer: &'static str,
}

impl DiscoveryPayload {
    /// Describe the cover living on `topics`, identified by `object_id`.
    #[must_use]
    pub fn new(topics: &Topics, object_id: &str) -> Self {
        Self {
            name: "Garage Door",
            device_class: "garage",
            command_topic: topics.action.clone(),
            state_topic: topics.state.clone(),
            payload_open: "open",
            payload_close: "close",
            payload_stop: "stop",
            state_open: "open",
            state_closed: "closed",
            unique_id: object_id.to_string(),
            device: DiscoveryDevice {
                identifiers: object_id.to_string(),
                name: "Garage Door",
                model: "Generic Garage Door",
                manufacturer: "n/a",
            },
        }
    }
}
