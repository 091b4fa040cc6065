//! Chat and topic message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MessageId, TopicId, UserId};

/// A chat line or topic reply.
///
/// Immutable once built. The author's display name is resolved once at
/// creation time and stored alongside the author identity so read paths
/// never have to look it up again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message ID.
    pub id: MessageId,
    /// Topic this message replies to; `None` for live chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
    /// Author identity.
    pub user_id: UserId,
    /// Author display name.
    pub username: String,
    /// Message text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// `true` for live chat, `false` for a topic reply.
    pub is_chat: bool,
}

impl ChatMessage {
    /// Build a live chat message stamped with the current time.
    pub fn chat(user_id: UserId, username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            topic_id: None,
            user_id,
            username: username.into(),
            content: content.into(),
            created_at: Utc::now(),
            is_chat: true,
        }
    }

    /// Build a reply to a topic stamped with the current time.
    pub fn topic_reply(
        topic_id: TopicId,
        user_id: UserId,
        username: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            topic_id: Some(topic_id),
            user_id,
            username: username.into(),
            content: content.into(),
            created_at: Utc::now(),
            is_chat: false,
        }
    }
}

/// Profile data the auth service knows about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identity.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Role name (`"admin"` or `"user"`).
    pub role: String,
}

impl UserInfo {
    /// Whether the user holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}
