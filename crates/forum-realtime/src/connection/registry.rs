//! Connection registry: the authoritative map from user to live connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tracing::info;

use forum_core::config::ChatConfig;
use forum_core::types::UserId;

use crate::metrics::HubMetrics;
use crate::presence::tracker::PresenceTracker;

use super::handle::{ConnectionHandle, ConnectionId};
use super::sink::{FrameSink, WriterContext, run_writer};

/// Thread-safe registry holding at most one live connection per user.
///
/// All mutations take the write lock; snapshots take the read lock and copy
/// the entries out, so callers iterate without holding any lock. Presence
/// announcements are issued while the write lock is held, which keeps them
/// in mutation order.
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// User ID → live connection handle.
    connections: RwLock<HashMap<UserId, Arc<ConnectionHandle>>>,
    /// Presence tracker notified on every membership change.
    presence: Arc<PresenceTracker>,
    /// Metrics.
    metrics: Arc<HubMetrics>,
    /// Capacity of each connection's outbound queue.
    buffer_size: usize,
    /// Upper bound on a single transport write.
    write_timeout: Duration,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new(config: &ChatConfig, presence: Arc<PresenceTracker>, metrics: Arc<HubMetrics>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            presence,
            metrics,
            buffer_size: config.connection_buffer_size.max(1),
            write_timeout: config.write_timeout(),
        }
    }

    /// Installs a transport as the live connection for `user_id`.
    ///
    /// Spawns the connection's writer task. A connection already registered
    /// for the same user is replaced and closed. Always announces the new
    /// online count.
    pub async fn register<S: FrameSink>(
        self: &Arc<Self>,
        user_id: UserId,
        sink: S,
    ) -> Arc<ConnectionHandle> {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id.clone(), tx));

        let ctx = WriterContext {
            user_id: user_id.clone(),
            conn_id: handle.id,
            write_timeout: self.write_timeout,
            closed: handle.close_token(),
        };
        tokio::spawn(run_writer(Arc::clone(self), ctx, sink, rx));

        let (displaced, online) = {
            let mut connections = self.connections.write().await;
            let displaced = connections.insert(user_id.clone(), Arc::clone(&handle));
            self.presence.membership_changed(connections.len());
            (displaced, connections.len())
        };

        if let Some(old) = displaced {
            old.close();
            info!(
                user_id = %user_id,
                old_conn_id = %old.id,
                conn_id = %handle.id,
                "Connection replaced by a newer one"
            );
        }

        self.metrics.connection_opened();

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            online,
            "Chat connection registered"
        );

        handle
    }

    /// Removes whatever connection is registered for `user_id`.
    ///
    /// Idempotent: returns `false` and announces nothing when the user has
    /// no live connection.
    pub async fn unregister(&self, user_id: &UserId) -> bool {
        let removed = {
            let mut connections = self.connections.write().await;
            let removed = connections.remove(user_id);
            if removed.is_some() {
                self.presence.membership_changed(connections.len());
            }
            removed
        };

        match removed {
            Some(handle) => {
                handle.close();
                info!(conn_id = %handle.id, user_id = %user_id, "Chat connection unregistered");
                true
            }
            None => false,
        }
    }

    /// Removes a failed connection.
    ///
    /// Only removes the entry if `conn_id` is still the user's live
    /// connection, so a stale failure never evicts a replacement.
    pub async fn evict(&self, user_id: &UserId, conn_id: ConnectionId) -> bool {
        let Some(handle) = self.remove_if_current(user_id, conn_id).await else {
            return false;
        };

        handle.close();
        self.metrics.connection_evicted();
        info!(conn_id = %conn_id, user_id = %user_id, "Chat connection evicted");
        true
    }

    /// Removes a connection whose client closed it cleanly.
    pub async fn release(&self, user_id: &UserId, conn_id: ConnectionId) -> bool {
        let Some(handle) = self.remove_if_current(user_id, conn_id).await else {
            return false;
        };

        handle.close();
        info!(conn_id = %conn_id, user_id = %user_id, "Chat connection closed by client");
        true
    }

    /// Removes a connection the hub admitted while shutdown was beginning.
    pub async fn retract(&self, user_id: &UserId, conn_id: ConnectionId) -> bool {
        let Some(handle) = self.remove_if_current(user_id, conn_id).await else {
            return false;
        };

        handle.close();
        info!(conn_id = %conn_id, user_id = %user_id, "Chat connection refused during shutdown");
        true
    }

    async fn remove_if_current(
        &self,
        user_id: &UserId,
        conn_id: ConnectionId,
    ) -> Option<Arc<ConnectionHandle>> {
        let mut connections = self.connections.write().await;
        if connections.get(user_id).is_none_or(|h| h.id != conn_id) {
            return None;
        }
        let removed = connections.remove(user_id);
        self.presence.membership_changed(connections.len());
        removed
    }

    /// Point-in-time copy of every (user, connection) pair.
    pub async fn snapshot(&self) -> Vec<(UserId, Arc<ConnectionHandle>)> {
        self.connections
            .read()
            .await
            .iter()
            .map(|(user_id, handle)| (user_id.clone(), Arc::clone(handle)))
            .collect()
    }

    /// Gets the live connection for a user.
    pub async fn get(&self, user_id: &UserId) -> Option<Arc<ConnectionHandle>> {
        self.connections.read().await.get(user_id).cloned()
    }

    /// Number of registered users.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether no user is registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// The presence set: identities currently registered, sorted.
    pub async fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.connections.read().await.keys().cloned().collect();
        users.sort();
        users
    }

    /// Closes and removes every connection without announcing presence.
    ///
    /// Used during shutdown. Returns how many connections were closed.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<Arc<ConnectionHandle>> = {
            let mut connections = self.connections.write().await;
            let drained = connections.drain().map(|(_, handle)| handle).collect();
            self.presence.clear();
            drained
        };

        for handle in &drained {
            handle.close();
        }

        info!(count = drained.len(), "All chat connections closed");
        drained.len()
    }

    /// Presence tracker this registry reports to.
    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }
}
