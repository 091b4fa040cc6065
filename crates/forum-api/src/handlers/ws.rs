//! WebSocket upgrade handler.

use async_trait::async_trait;
use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_core::types::UserInfo;
use forum_realtime::{FrameSink, InboundFrame};

use crate::error::ApiError;
use crate::extractors::BearerToken;
use crate::state::AppState;

/// Adapts the write half of an axum WebSocket to the hub's transport trait.
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WsSink {
    /// Wrap a split WebSocket sink.
    pub fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, frame: &str) -> AppResult<()> {
        self.inner
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "WebSocket write failed", e))
    }

    async fn close(&mut self) -> AppResult<()> {
        self.inner
            .close()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "WebSocket close failed", e))
    }
}

/// Maps an axum WebSocket message to a hub frame.
fn inbound_frame(message: Result<Message, axum::Error>) -> AppResult<InboundFrame> {
    match message {
        Ok(Message::Text(text)) => Ok(InboundFrame::Text(text.as_str().to_owned())),
        Ok(Message::Binary(data)) => Ok(InboundFrame::Binary(data.to_vec())),
        Ok(Message::Ping(_)) => Ok(InboundFrame::Ping),
        Ok(Message::Pong(_)) => Ok(InboundFrame::Pong),
        Ok(Message::Close(_)) => Ok(InboundFrame::Close),
        Err(e) => Err(AppError::transport(format!("WebSocket read failed: {e}"))),
    }
}

/// GET /ws?token={jwt}
///
/// The token is checked and the caller's profile resolved before the
/// upgrade, so a rejected client gets a plain 401 and never sees a
/// WebSocket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    token: BearerToken,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let author = state.hub.admit_profile(token.as_deref()).await?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let upgrade_user = author.user_id.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            warn!(user_id = %upgrade_user, error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| handle_socket(state, author, socket)))
}

/// Runs an upgraded socket until the hub or the client ends it.
async fn handle_socket(state: AppState, author: UserInfo, socket: WebSocket) {
    let (ws_tx, ws_rx) = socket.split();
    let user_id = author.user_id.clone();

    info!(user_id = %user_id, "WebSocket connection established");

    let end = state
        .hub
        .serve_connection(author, WsSink::new(ws_tx), ws_rx.map(inbound_frame))
        .await;

    debug!(user_id = %user_id, end = ?end, "WebSocket session ended");
}
