//! JSON serialization for WebSocket messages.

use super::types::{InboundMessage, OutboundMessage};

/// Serialize an outbound message.
pub fn serialize_outbound(msg: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize an inbound message.
pub fn deserialize_inbound(text: &str) -> Result<InboundMessage, serde_json::Error> {
    serde_json::from_str(text)
}
