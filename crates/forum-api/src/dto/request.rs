//! Request query DTOs.

use serde::{Deserialize, Serialize};

/// Query string of `GET /api/chat/messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Number of messages to return.
    pub limit: Option<u32>,
}

impl HistoryQuery {
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 50;
    /// Upper bound on the page size.
    pub const MAX_LIMIT: u32 = 500;

    /// Requested limit clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Query string carrying a bearer token, as on the WebSocket upgrade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WsQuery {
    /// Bearer token.
    pub token: Option<String>,
}

/// Body of `POST /api/topics/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostReplyRequest {
    /// Reply text.
    pub content: String,
}
