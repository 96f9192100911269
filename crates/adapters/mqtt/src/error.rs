//! MQTT adapter error types.

/// Errors specific to the MQTT bridge.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// [`MqttBridge::start`](crate::MqttBridge::start) was called twice.
    #[error("MQTT bridge already started")]
    AlreadyStarted,

    /// The rumqttc client refused a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The discovery payload could not be serialized.
    #[error("failed to serialize MQTT payload")]
    Payload(#[source] serde_json::Error),
}
