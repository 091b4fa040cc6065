//! Inbound chat entry point: persist first, then broadcast.

use std::sync::Arc;

use tracing::{debug, error};

use forum_core::error::AppError;
use forum_core::traits::{AuthValidator, MessagePersister};
use forum_core::types::{ChatMessage, TopicId, UserId, UserInfo};

use crate::broadcaster::Broadcaster;
use crate::message::types::Envelope;
use crate::message::validator::validate_chat_text;
use crate::metrics::HubMetrics;

/// Turns client text into stored, broadcast chat messages.
#[derive(Clone)]
pub struct ChatService {
    /// Resolves author display names.
    auth: Arc<dyn AuthValidator>,
    /// Durable store.
    persister: Arc<dyn MessagePersister>,
    /// Fan-out queue.
    broadcaster: Broadcaster,
    /// Upper bound on message text, in bytes.
    max_message_bytes: usize,
    /// Metrics.
    metrics: Arc<HubMetrics>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("max_message_bytes", &self.max_message_bytes)
            .finish()
    }
}

impl ChatService {
    /// Creates a new chat service.
    pub fn new(
        auth: Arc<dyn AuthValidator>,
        persister: Arc<dyn MessagePersister>,
        broadcaster: Broadcaster,
        max_message_bytes: usize,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            auth,
            persister,
            broadcaster,
            max_message_bytes,
            metrics,
        }
    }

    /// Handles one chat line sent by `user_id`, looking the author up first.
    ///
    /// Sessions resolve their author at admission and call [`Self::send_as`]
    /// instead, so they never depend on the profile still being cached.
    pub async fn handle_chat_message(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<ChatMessage, AppError> {
        validate_chat_text(text, self.max_message_bytes)?;
        let author = self.auth.get_user_info(user_id).await?;
        self.send_as(&author, text).await
    }

    /// Handles one chat line from an already resolved author.
    ///
    /// The author's display name is stored on the message. If persisting
    /// fails the error is returned and nothing is broadcast.
    pub async fn send_as(&self, author: &UserInfo, text: &str) -> Result<ChatMessage, AppError> {
        let content = validate_chat_text(text, self.max_message_bytes)?;

        let message = ChatMessage::chat(author.user_id.clone(), author.username.clone(), content);
        self.publish(message.clone()).await?;
        Ok(message)
    }

    /// Stores a reply to `topic_id`. Replies are never broadcast.
    pub async fn reply_to_topic(
        &self,
        topic_id: TopicId,
        author: &UserInfo,
        text: &str,
    ) -> Result<ChatMessage, AppError> {
        let content = validate_chat_text(text, self.max_message_bytes)?;

        let message = ChatMessage::topic_reply(
            topic_id,
            author.user_id.clone(),
            author.username.clone(),
            content,
        );
        self.publish(message.clone()).await?;
        Ok(message)
    }

    /// Persists a message and, if it is live chat, submits it for fan-out.
    ///
    /// Returns whether the message was queued for broadcast. Topic replies
    /// are stored only.
    pub async fn publish(&self, message: ChatMessage) -> Result<bool, AppError> {
        if let Err(e) = self.persister.store(&message).await {
            error!(
                message_id = %message.id,
                user_id = %message.user_id,
                error = %e,
                "Failed to persist chat message"
            );
            return Err(e);
        }
        self.metrics.message_persisted();

        if !message.is_chat {
            debug!(message_id = %message.id, "Topic reply stored, not broadcast");
            return Ok(false);
        }

        Ok(self.broadcaster.submit(Envelope::from(message)).await)
    }
}
