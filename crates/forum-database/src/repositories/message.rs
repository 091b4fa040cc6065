//! Message repository implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_core::traits::{MessageHistory, MessagePersister};
use forum_core::types::{ChatMessage, MessageId, TopicId, UserId};

/// Row shape of the `messages` table.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: MessageId,
    topic_id: Option<TopicId>,
    user_id: String,
    username: String,
    content: String,
    created_at: DateTime<Utc>,
    is_chat: bool,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            topic_id: row.topic_id,
            user_id: UserId::from(row.user_id),
            username: row.username,
            content: row.content,
            created_at: row.created_at,
            is_chat: row.is_chat,
        }
    }
}

/// Repository for chat and topic messages.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessagePersister for MessageRepository {
    async fn store(&self, message: &ChatMessage) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO messages (id, topic_id, user_id, username, content, created_at, is_chat) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(message.id)
        .bind(message.topic_id)
        .bind(message.user_id.as_str())
        .bind(&message.username)
        .bind(&message.content)
        .bind(message.created_at)
        .bind(message.is_chat)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store message", e))?;

        Ok(())
    }

    async fn delete_older_than(&self, max_age: Duration) -> AppResult<u64> {
        let age = chrono::Duration::from_std(max_age)
            .map_err(|e| AppError::validation(format!("Retention age out of range: {e}")))?;
        let cutoff = Utc::now() - age;

        let result = sqlx::query("DELETE FROM messages WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete old messages", e)
            })?;

        debug!(cutoff = %cutoff, deleted = result.rows_affected(), "Deleted old messages");
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl MessageHistory for MessageRepository {
    async fn recent_chat(&self, limit: u32) -> AppResult<Vec<ChatMessage>> {
        let mut rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, topic_id, user_id, username, content, created_at, is_chat \
             FROM messages WHERE is_chat = TRUE ORDER BY created_at DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list chat messages", e))?;

        rows.reverse();
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    async fn topic_messages(&self, topic_id: TopicId) -> AppResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, topic_id, user_id, username, content, created_at, is_chat \
             FROM messages WHERE topic_id = $1 AND is_chat = FALSE ORDER BY created_at ASC",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list topic messages", e)
        })?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }
}
