//! Read access to stored messages.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{ChatMessage, TopicId};

/// Reads back what a [`super::MessagePersister`] stored.
#[async_trait]
pub trait MessageHistory: Send + Sync + 'static {
    /// The most recent live chat messages, oldest first.
    async fn recent_chat(&self, limit: u32) -> AppResult<Vec<ChatMessage>>;

    /// Every reply to a topic, oldest first.
    async fn topic_messages(&self, topic_id: TopicId) -> AppResult<Vec<ChatMessage>>;
}
