//! Broadcaster: the single fan-out pipeline from producers to every connection.
//!
//! Producers [`Broadcaster::submit`] envelopes onto one bounded FIFO queue.
//! A single [`BroadcastLoop`] drains it; for each envelope it serializes
//! once, takes a registry snapshot, and hands the frame to every
//! connection's own outbound queue. Connection writers do the actual I/O,
//! so a slow client never holds up delivery to the others.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use forum_core::config::ChatConfig;
use forum_core::types::UserId;

use crate::connection::registry::ConnectionRegistry;
use crate::message::serializer::serialize_envelope;
use crate::message::types::Envelope;
use crate::metrics::HubMetrics;

/// Producer side of the broadcast queue. Cheap to clone.
///
/// Queue-full policy: `submit` waits up to the configured submit timeout
/// for space and then drops the envelope with a warning. Persistence
/// happens before submission, so a drop only affects live delivery.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    /// Central FIFO queue.
    queue: mpsc::Sender<Envelope>,
    /// Bounded wait for queue space.
    submit_timeout: Duration,
    /// Metrics.
    metrics: Arc<HubMetrics>,
}

/// Outcome of delivering one envelope to a registry snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Connections the frame was queued for.
    pub delivered: usize,
    /// Users whose connections failed and were evicted.
    pub evicted: Vec<UserId>,
}

impl Broadcaster {
    /// Creates the broadcast queue, returning its producer and consumer halves.
    pub fn channel(
        config: &ChatConfig,
        metrics: Arc<HubMetrics>,
    ) -> (Self, mpsc::Receiver<Envelope>) {
        let (queue, rx) = mpsc::channel(config.broadcast_queue_size.max(1));
        (
            Self {
                queue,
                submit_timeout: config.submit_timeout(),
                metrics,
            },
            rx,
        )
    }

    /// Enqueues an envelope, waiting at most the submit timeout for space.
    ///
    /// Returns `false` if the envelope was dropped.
    pub async fn submit(&self, envelope: Envelope) -> bool {
        let kind = envelope.kind();
        match self.queue.send_timeout(envelope, self.submit_timeout).await {
            Ok(()) => {
                self.metrics.envelope_submitted();
                true
            }
            Err(mpsc::error::SendTimeoutError::Timeout(_)) => {
                self.metrics.envelope_dropped();
                warn!(
                    kind,
                    timeout_ms = self.submit_timeout.as_millis() as u64,
                    "Broadcast queue full, dropping envelope"
                );
                false
            }
            Err(mpsc::error::SendTimeoutError::Closed(_)) => {
                self.metrics.envelope_dropped();
                debug!(kind, "Broadcast queue closed, dropping envelope");
                false
            }
        }
    }

    /// Enqueues an envelope only if there is space right now.
    pub fn try_submit(&self, envelope: Envelope) -> bool {
        let kind = envelope.kind();
        match self.queue.try_send(envelope) {
            Ok(()) => {
                self.metrics.envelope_submitted();
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.envelope_dropped();
                warn!(kind, "Broadcast queue full, dropping envelope");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.envelope_dropped();
                debug!(kind, "Broadcast queue closed, dropping envelope");
                false
            }
        }
    }

    /// Whether the consumer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

/// Writes `envelope` to every connection in a registry snapshot.
///
/// A connection whose queue is closed or full counts as failed and is
/// evicted; the remaining connections still receive the frame.
pub async fn fan_out(
    registry: &ConnectionRegistry,
    envelope: &Envelope,
    metrics: &HubMetrics,
) -> FanOutReport {
    let frame = match serialize_envelope(envelope) {
        Ok(frame) => frame,
        Err(e) => {
            error!(kind = envelope.kind(), error = %e, "Failed to serialize envelope");
            return FanOutReport::default();
        }
    };

    let mut report = FanOutReport::default();

    for (user_id, handle) in registry.snapshot().await {
        match handle.try_enqueue(Arc::clone(&frame)) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(
                    conn_id = %handle.id,
                    user_id = %user_id,
                    kind = envelope.kind(),
                    error = %e,
                    "Delivery failed"
                );
                if registry.evict(&user_id, handle.id).await {
                    report.evicted.push(user_id);
                }
            }
        }
    }

    metrics.frames_delivered(report.delivered as u64);
    report
}

/// The single consumer of the broadcast queue.
#[derive(Debug)]
pub struct BroadcastLoop {
    /// Consumer half of the queue.
    queue: mpsc::Receiver<Envelope>,
    /// Registry to fan out to.
    registry: Arc<ConnectionRegistry>,
    /// Metrics.
    metrics: Arc<HubMetrics>,
    /// Bound on draining queued envelopes at shutdown.
    drain_timeout: Duration,
}

impl BroadcastLoop {
    /// Create the loop over the consumer half returned by [`Broadcaster::channel`].
    pub fn new(
        queue: mpsc::Receiver<Envelope>,
        registry: Arc<ConnectionRegistry>,
        metrics: Arc<HubMetrics>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            registry,
            metrics,
            drain_timeout,
        }
    }

    /// Deliver envelopes in FIFO order until shutdown.
    ///
    /// On shutdown the queue is closed to new submissions and what is
    /// already queued is delivered, bounded by the drain timeout.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Broadcaster started");

        loop {
            tokio::select! {
                envelope = self.queue.recv() => match envelope {
                    Some(envelope) => {
                        fan_out(&self.registry, &envelope, &self.metrics).await;
                    }
                    None => break,
                },
                _ = shutdown.changed() => {
                    self.drain().await;
                    break;
                }
            }
        }

        info!("Broadcaster stopped");
    }

    async fn drain(&mut self) {
        self.queue.close();

        let drained = tokio::time::timeout(self.drain_timeout, async {
            let mut count = 0usize;
            while let Some(envelope) = self.queue.recv().await {
                fan_out(&self.registry, &envelope, &self.metrics).await;
                count += 1;
            }
            count
        })
        .await;

        match drained {
            Ok(count) => info!(count, "Broadcast queue drained"),
            Err(_) => warn!(
                timeout_secs = self.drain_timeout.as_secs(),
                "Broadcast drain timed out, remaining envelopes dropped"
            ),
        }
    }
}
