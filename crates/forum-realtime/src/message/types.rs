//! Inbound and outbound WebSocket message type definitions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use forum_core::types::ChatMessage;

/// A serialized envelope ready to be written to a connection.
///
/// Envelopes are serialized once per fan-out and the text is shared by
/// every recipient's queue.
pub type Frame = Arc<str>;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Chat text.
    pub text: String,
}

/// Non-chat payloads that share the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Number of users currently online.
    OnlineCount {
        /// Online user count after the latest membership change.
        count: usize,
    },
    /// Liveness probe. Exists only to surface dead transports through write failure.
    Ping,
}

/// One JSON frame sent by the server.
///
/// The shape is tagged implicitly: control notices carry a `type` field,
/// chat messages do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    /// Online-count notice or liveness ping.
    Control(ControlMessage),
    /// A chat message.
    Chat(ChatMessage),
}

impl Envelope {
    /// Online-count notice.
    pub fn online_count(count: usize) -> Self {
        Self::Control(ControlMessage::OnlineCount { count })
    }

    /// Liveness ping.
    pub fn ping() -> Self {
        Self::Control(ControlMessage::Ping)
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Control(ControlMessage::OnlineCount { .. }) => "online_count",
            Self::Control(ControlMessage::Ping) => "ping",
            Self::Chat(_) => "chat",
        }
    }
}

impl From<ChatMessage> for Envelope {
    fn from(message: ChatMessage) -> Self {
        Self::Chat(message)
    }
}
