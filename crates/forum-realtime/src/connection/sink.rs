//! Transport abstraction and the per-connection writer task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use forum_core::error::AppError;
use forum_core::result::AppResult;
use forum_core::types::UserId;

use crate::message::types::Frame;

use super::handle::ConnectionId;
use super::registry::ConnectionRegistry;

/// The writable half of a client transport.
///
/// The HTTP layer adapts its WebSocket sink to this trait; tests use
/// in-memory implementations.
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Write one text frame.
    async fn send_text(&mut self, frame: &str) -> AppResult<()>;

    /// Close the transport gracefully.
    async fn close(&mut self) -> AppResult<()>;
}

/// Identity and limits a writer task runs with.
#[derive(Debug, Clone)]
pub(crate) struct WriterContext {
    pub(crate) user_id: UserId,
    pub(crate) conn_id: ConnectionId,
    pub(crate) write_timeout: Duration,
    pub(crate) closed: CancellationToken,
}

/// Drain a connection's outbound queue into its transport.
///
/// Ends when the connection is closed (after flushing what is already
/// queued) or when a write fails or times out. A failed write evicts the
/// connection from the registry.
pub(crate) async fn run_writer<S: FrameSink>(
    registry: Arc<ConnectionRegistry>,
    ctx: WriterContext,
    mut sink: S,
    mut outbound: mpsc::Receiver<Frame>,
) {
    loop {
        let frame = tokio::select! {
            biased;
            frame = outbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            _ = ctx.closed.cancelled() => break,
        };

        let written = match tokio::time::timeout(ctx.write_timeout, sink.send_text(&frame)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::transport(format!(
                "Write timed out after {:?}",
                ctx.write_timeout
            ))),
        };

        if let Err(e) = written {
            warn!(
                conn_id = %ctx.conn_id,
                user_id = %ctx.user_id,
                error = %e,
                "Write to connection failed, evicting"
            );
            ctx.closed.cancel();
            outbound.close();
            registry.evict(&ctx.user_id, ctx.conn_id).await;
            return;
        }
    }

    outbound.close();
    if let Err(e) = sink.close().await {
        debug!(conn_id = %ctx.conn_id, error = %e, "Transport close failed");
    }
    debug!(conn_id = %ctx.conn_id, user_id = %ctx.user_id, "Writer task ended");
}
