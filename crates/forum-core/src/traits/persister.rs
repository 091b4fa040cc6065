//! Durable message storage.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::ChatMessage;

/// Durable store for chat and topic messages.
#[async_trait]
pub trait MessagePersister: Send + Sync + 'static {
    /// Persist a message. The hub calls this before any fan-out.
    async fn store(&self, message: &ChatMessage) -> AppResult<()>;

    /// Delete every message created more than `max_age` ago.
    ///
    /// Returns the number of deleted messages.
    async fn delete_older_than(&self, max_age: Duration) -> AppResult<u64>;
}
