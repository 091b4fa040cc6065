//! Presence and message history handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use forum_core::types::{ChatMessage, TopicId};

use crate::dto::request::{HistoryQuery, PostReplyRequest};
use crate::dto::response::{ApiResponse, MessagesResponse, OnlineUsersResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/chat/online
pub async fn online_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Json<ApiResponse<OnlineUsersResponse>> {
    let users = state.hub.online_users().await;
    Json(ApiResponse::ok(OnlineUsersResponse {
        count: users.len(),
        users,
    }))
}

/// GET /api/chat/messages?limit=
pub async fn recent_messages(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<MessagesResponse>>, ApiError> {
    let messages = state.history.recent_chat(query.limit()).await?;
    Ok(Json(ApiResponse::ok(MessagesResponse { messages })))
}

/// GET /api/topics/{id}/messages
pub async fn topic_messages(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(topic_id): Path<TopicId>,
) -> Result<Json<ApiResponse<MessagesResponse>>, ApiError> {
    let messages = state.history.topic_messages(topic_id).await?;
    Ok(Json(ApiResponse::ok(MessagesResponse { messages })))
}

/// POST /api/topics/{id}/messages
///
/// Stores a reply to the topic. Replies are not pushed to chat clients.
pub async fn create_topic_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(topic_id): Path<TopicId>,
    Json(body): Json<PostReplyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ChatMessage>>), ApiError> {
    let message = state.hub.reply_to_topic(topic_id, &auth, &body.content).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}
