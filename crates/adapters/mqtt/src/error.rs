//! MQTT adapter error types.

use feedbridge_domain::error::FeedBridgeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// No broker connection is established.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),

    /// Failed to encode a value before publishing it.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),
}

impl From<MqttError> for FeedBridgeError {
    fn from(err: MqttError) -> Self {
        FeedBridgeError::remote(err)
    }
}
