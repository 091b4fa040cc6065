//! Chat hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Chat hub (WebSocket broadcast) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Capacity of the central broadcast queue.
    #[serde(default = "default_broadcast_queue")]
    pub broadcast_queue_size: usize,
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer_size: usize,
    /// How long `submit` waits for broadcast queue space before dropping, in milliseconds.
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_ms: u64,
    /// Upper bound on a single write to a client, in seconds.
    #[serde(default = "default_write_timeout")]
    pub write_timeout_seconds: u64,
    /// Period of the liveness probe, in seconds.
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_seconds: u64,
    /// Upper bound on draining queued broadcasts during shutdown, in seconds.
    #[serde(default = "default_drain_timeout")]
    pub shutdown_drain_timeout_seconds: u64,
    /// Maximum accepted chat text length in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            broadcast_queue_size: default_broadcast_queue(),
            connection_buffer_size: default_connection_buffer(),
            submit_timeout_ms: default_submit_timeout(),
            write_timeout_seconds: default_write_timeout(),
            liveness_interval_seconds: default_liveness_interval(),
            shutdown_drain_timeout_seconds: default_drain_timeout(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl ChatConfig {
    /// Liveness probe period. Never zero.
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_seconds.max(1))
    }

    /// Bounded wait for broadcast queue space.
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    /// Upper bound on a single transport write. Never zero.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_seconds.max(1))
    }

    /// Bounded drain window on shutdown.
    pub fn shutdown_drain_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_drain_timeout_seconds)
    }
}

fn default_broadcast_queue() -> usize {
    256
}

fn default_connection_buffer() -> usize {
    64
}

fn default_submit_timeout() -> u64 {
    100
}

fn default_write_timeout() -> u64 {
    10
}

fn default_liveness_interval() -> u64 {
    300
}

fn default_drain_timeout() -> u64 {
    5
}

fn default_max_message_bytes() -> usize {
    4096
}
