//! Hub metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Hub-level metrics counters.
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Connections registered since start.
    connections_opened: AtomicU64,
    /// Connections removed because of a transport or protocol failure.
    evictions: AtomicU64,
    /// Envelopes accepted by the broadcast queue.
    envelopes_submitted: AtomicU64,
    /// Envelopes dropped because the broadcast queue stayed full or was closed.
    envelopes_dropped: AtomicU64,
    /// Frames handed to connection queues.
    frames_delivered: AtomicU64,
    /// Inbound chat messages persisted.
    messages_persisted: AtomicU64,
}

impl HubMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_evicted(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn envelope_submitted(&self) {
        self.envelopes_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn envelope_dropped(&self) {
        self.envelopes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frames_delivered(&self, count: u64) {
        self.frames_delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn message_persisted(&self) {
        self.messages_persisted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            envelopes_submitted: self.envelopes_submitted.load(Ordering::Relaxed),
            envelopes_dropped: self.envelopes_dropped.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            messages_persisted: self.messages_persisted.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections registered since start
    pub connections_opened: u64,
    /// Connections evicted after a failure
    pub evictions: u64,
    /// Envelopes accepted for broadcast
    pub envelopes_submitted: u64,
    /// Envelopes dropped before broadcast
    pub envelopes_dropped: u64,
    /// Frames queued to connections
    pub frames_delivered: u64,
    /// Chat messages persisted
    pub messages_persisted: u64,
}
