//! JSON serialization for WebSocket messages.

use forum_core::error::AppError;

use super::types::{ClientMessage, Envelope, Frame};

/// Serialize an outbound envelope into a shareable frame.
pub fn serialize_envelope(envelope: &Envelope) -> Result<Frame, serde_json::Error> {
    serde_json::to_string(envelope).map(Frame::from)
}

/// Decode a client text frame.
///
/// Anything that is not a JSON object with a string `text` field is a
/// protocol error.
pub fn deserialize_inbound(text: &str) -> Result<ClientMessage, AppError> {
    serde_json::from_str(text)
        .map_err(|e| AppError::protocol(format!("Malformed chat frame: {e}")))
}
