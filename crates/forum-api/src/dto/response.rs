//! Response DTOs.

use serde::{Deserialize, Serialize};

use forum_core::types::{ChatMessage, UserId};
use forum_realtime::metrics::MetricsSnapshot;

/// Standard success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Basic health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
    /// Users online right now.
    pub online_users: usize,
    /// Hub counters.
    pub hub: MetricsSnapshot,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status: `ok` or `degraded`.
    pub status: String,
    /// Database status.
    pub database: String,
    /// Database round trip, when reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_latency_ms: Option<u64>,
    /// Online users.
    pub online_users: usize,
    /// Whether the hub is shutting down.
    pub shutting_down: bool,
    /// Hub counters.
    pub hub: MetricsSnapshot,
}

/// Presence listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    /// Number of users online.
    pub count: usize,
    /// Who is online, sorted.
    pub users: Vec<UserId>,
}

/// A page of stored messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Messages, oldest first.
    pub messages: Vec<ChatMessage>,
}
