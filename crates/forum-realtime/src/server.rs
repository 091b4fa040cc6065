//! Top-level chat hub that ties together all subsystems.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use forum_core::config::ChatConfig;
use forum_core::error::AppError;
use forum_core::result::AppResult;
use forum_core::traits::{AuthValidator, MessagePersister};
use forum_core::types::{ChatMessage, TopicId, UserId, UserInfo};

use crate::broadcaster::{BroadcastLoop, Broadcaster};
use crate::chat::ChatService;
use crate::connection::admission::Admission;
use crate::connection::handle::ConnectionHandle;
use crate::connection::liveness::LivenessMonitor;
use crate::connection::registry::ConnectionRegistry;
use crate::connection::session::{InboundFrame, SessionEnd, run_session};
use crate::connection::sink::FrameSink;
use crate::message::types::Envelope;
use crate::metrics::{HubMetrics, MetricsSnapshot};
use crate::presence::tracker::PresenceTracker;

/// Central chat hub that coordinates registry, broadcaster, presence, and liveness.
#[derive(Clone)]
pub struct ChatHub {
    /// Connection registry.
    registry: Arc<ConnectionRegistry>,
    /// Broadcast producer.
    broadcaster: Broadcaster,
    /// Inbound chat entry point.
    chat: ChatService,
    /// Admission gate.
    admission: Admission,
    /// Metrics collector.
    metrics: Arc<HubMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: Arc<watch::Sender<bool>>,
    /// Background tasks owned by the hub.
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl std::fmt::Debug for ChatHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHub").finish()
    }
}

impl ChatHub {
    /// Builds the hub and spawns the broadcaster and liveness monitor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        config: &ChatConfig,
        auth: Arc<dyn AuthValidator>,
        persister: Arc<dyn MessagePersister>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let metrics = Arc::new(HubMetrics::new());
        let (broadcaster, queue) = Broadcaster::channel(config, Arc::clone(&metrics));
        let presence = Arc::new(PresenceTracker::new(broadcaster.clone()));
        let registry = Arc::new(ConnectionRegistry::new(
            config,
            presence,
            Arc::clone(&metrics),
        ));
        let chat = ChatService::new(
            Arc::clone(&auth),
            persister,
            broadcaster.clone(),
            config.max_message_bytes,
            Arc::clone(&metrics),
        );

        let broadcast_loop = BroadcastLoop::new(
            queue,
            Arc::clone(&registry),
            Arc::clone(&metrics),
            config.shutdown_drain_timeout(),
        );
        let liveness = LivenessMonitor::new(
            Arc::clone(&registry),
            Arc::clone(&metrics),
            config.liveness_interval(),
        );

        let tasks = vec![
            tokio::spawn(broadcast_loop.run(shutdown_rx.clone())),
            tokio::spawn(liveness.run(shutdown_rx)),
        ];

        info!("Chat hub started");

        Self {
            registry,
            broadcaster,
            chat,
            admission: Admission::new(auth),
            metrics,
            shutdown_tx: Arc::new(shutdown_tx),
            tasks: Arc::new(Mutex::new(tasks)),
        }
    }

    /// Installs `sink` as the live connection for `user_id`.
    pub async fn register<S: FrameSink>(&self, user_id: UserId, sink: S) -> Arc<ConnectionHandle> {
        self.registry.register(user_id, sink).await
    }

    /// Removes the user's connection, if any.
    pub async fn unregister(&self, user_id: &UserId) -> bool {
        self.registry.unregister(user_id).await
    }

    /// Queues an envelope for every connection.
    pub async fn submit(&self, envelope: Envelope) -> bool {
        self.broadcaster.submit(envelope).await
    }

    /// Resolves a bearer token to the caller's profile.
    pub async fn admit_profile(&self, token: Option<&str>) -> Result<UserInfo, AppError> {
        self.admission.admit_profile(token).await
    }

    /// Persists a chat line from `user_id` and broadcasts it.
    pub async fn handle_chat_message(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<ChatMessage, AppError> {
        self.chat.handle_chat_message(user_id, text).await
    }

    /// Stores a reply to a topic on behalf of `author`.
    pub async fn reply_to_topic(
        &self,
        topic_id: TopicId,
        author: &UserInfo,
        text: &str,
    ) -> Result<ChatMessage, AppError> {
        self.chat.reply_to_topic(topic_id, author, text).await
    }

    /// Persists a message and broadcasts it if it is live chat.
    pub async fn publish(&self, message: ChatMessage) -> Result<bool, AppError> {
        self.chat.publish(message).await
    }

    /// Registers a transport and runs its inbound loop until the connection ends.
    ///
    /// `author` is the profile resolved at admission; every chat line on
    /// this connection is attributed to it. The shutdown flag is checked
    /// after registering, so a connection that races shutdown is closed
    /// rather than left behind after [`Self::shutdown`] has cleared the
    /// registry.
    pub async fn serve_connection<S, R>(&self, author: UserInfo, sink: S, inbound: R) -> SessionEnd
    where
        S: FrameSink,
        R: Stream<Item = AppResult<InboundFrame>> + Unpin + Send,
    {
        let handle = self.registry.register(author.user_id.clone(), sink).await;

        if self.is_shutting_down() {
            warn!(user_id = %author.user_id, "Chat hub shutting down, refusing connection");
            self.registry.retract(&author.user_id, handle.id).await;
            handle.close();
            return SessionEnd::Removed;
        }

        run_session(&self.registry, &self.chat, &author, handle, inbound).await
    }

    /// Online user count.
    pub fn current_count(&self) -> usize {
        self.registry.presence().current_count()
    }

    /// Identities currently online, sorted.
    pub async fn online_users(&self) -> Vec<UserId> {
        self.registry.online_users().await
    }

    /// The connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Current metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Initiates a graceful shutdown of the chat hub.
    ///
    /// Stops the liveness monitor, lets the broadcaster drain what is
    /// queued, then closes every connection without presence notices.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!("Shutting down chat hub");

        self.shutdown_tx.send_replace(true);

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Chat hub task ended abnormally");
            }
        }

        let closed = self.registry.close_all().await;

        info!(closed, "Chat hub shut down");
        Ok(())
    }
}
