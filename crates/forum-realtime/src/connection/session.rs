//! Per-connection inbound loop.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_core::types::{UserId, UserInfo};

use crate::chat::ChatService;
use crate::message::serializer::deserialize_inbound;

use super::handle::ConnectionHandle;
use super::registry::ConnectionRegistry;

/// A frame read from the client, independent of the transport library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame. Not part of the chat protocol.
    Binary(Vec<u8>),
    /// Transport-level ping.
    Ping,
    /// Transport-level pong.
    Pong,
    /// Client-initiated close.
    Close,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client closed the connection.
    Closed,
    /// A read or protocol failure evicted the connection.
    Evicted,
    /// The hub removed the connection: a newer connection for the same
    /// user, a failed write, or shutdown.
    Removed,
}

/// Reads client frames until the connection ends.
///
/// Text frames are parsed and sent as `author`, the profile resolved when
/// the connection was admitted. Chat errors such
/// as validation or persistence failures are logged and the session goes
/// on. Malformed frames, binary frames, and read errors evict the
/// connection; a clean close or end of stream releases it.
pub async fn run_session<S>(
    registry: &ConnectionRegistry,
    chat: &ChatService,
    author: &UserInfo,
    handle: Arc<ConnectionHandle>,
    mut inbound: S,
) -> SessionEnd
where
    S: Stream<Item = AppResult<InboundFrame>> + Unpin + Send,
{
    let user_id = handle.user_id.clone();
    let conn_id = handle.id;

    let end = loop {
        let next = tokio::select! {
            _ = handle.closed() => break SessionEnd::Removed,
            next = inbound.next() => next,
        };

        let frame = match next {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                warn!(conn_id = %conn_id, user_id = %user_id, error = %e, "Read from connection failed");
                registry.evict(&user_id, conn_id).await;
                break SessionEnd::Evicted;
            }
            None => {
                registry.release(&user_id, conn_id).await;
                break SessionEnd::Closed;
            }
        };

        handle.touch().await;

        match frame {
            InboundFrame::Text(text) => {
                let message = match deserialize_inbound(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(conn_id = %conn_id, user_id = %user_id, error = %e, "Malformed frame");
                        registry.evict(&user_id, conn_id).await;
                        break SessionEnd::Evicted;
                    }
                };

                if let Err(e) = chat.send_as(author, &message.text).await {
                    log_chat_error(&user_id, &e);
                }
            }
            InboundFrame::Binary(data) => {
                warn!(
                    conn_id = %conn_id,
                    user_id = %user_id,
                    len = data.len(),
                    "Binary frame not supported"
                );
                registry.evict(&user_id, conn_id).await;
                break SessionEnd::Evicted;
            }
            InboundFrame::Ping | InboundFrame::Pong => {}
            InboundFrame::Close => {
                registry.release(&user_id, conn_id).await;
                break SessionEnd::Closed;
            }
        }
    };

    info!(conn_id = %conn_id, user_id = %user_id, end = ?end, "Chat session ended");
    end
}

fn log_chat_error(user_id: &UserId, e: &AppError) {
    match e.kind {
        ErrorKind::Validation => debug!(user_id = %user_id, error = %e, "Chat message rejected"),
        // Persistence failures are already logged by the chat service.
        ErrorKind::Database => {}
        _ => warn!(user_id = %user_id, error = %e, "Chat message failed"),
    }
}
