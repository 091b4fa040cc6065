//! Integration tests for the HTTP surface: WebSocket upgrade, presence,
//! history, and health endpoints.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use forum_core::types::{ChatMessage, TopicId, UserId};

#[tokio::test]
async fn test_ws_upgrade_without_token() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/ws").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_ws_upgrade_with_bad_token() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/ws?token=forged").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.hub.current_count(), 0);
}

#[tokio::test]
async fn test_health_check() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["online_users"], 0);
}

#[tokio::test]
async fn test_detailed_health_reports_unreachable_database() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health/detailed").await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert!(data.get("database").is_some());
    assert_eq!(data["shutting_down"], false);
    if data["database"] != "connected" {
        assert_eq!(data["status"], "degraded");
    }
}

#[tokio::test]
async fn test_online_users_requires_auth() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/chat/online").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request_as("GET", "/api/chat/online", "token-alice")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"], 0);
}

#[tokio::test]
async fn test_online_users_lists_connected_users() {
    let app = helpers::TestApp::new().await;
    let (sink_b, _bob) = helpers::channel_sink();
    let (sink_a, _alice) = helpers::channel_sink();
    app.hub.register(UserId::from("bob"), sink_b).await;
    app.hub.register(UserId::from("alice"), sink_a).await;

    let response = app
        .request("GET", "/api/chat/online?token=token-carol")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["count"], 2);
    assert_eq!(
        response.body["data"]["users"],
        serde_json::json!(["alice", "bob"])
    );
}

#[tokio::test]
async fn test_recent_messages_returns_latest_chat_oldest_first() {
    let app = helpers::TestApp::new().await;
    {
        let mut stored = app.persister.stored.lock().await;
        for n in 0..5 {
            stored.push(ChatMessage::chat(
                UserId::from("alice"),
                "alice",
                format!("message {n}"),
            ));
        }
        stored.push(ChatMessage::topic_reply(
            TopicId::new(),
            UserId::from("bob"),
            "bob",
            "a reply",
        ));
    }

    let response = app
        .request_as("GET", "/api/chat/messages?limit=3", "token-alice")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let messages = response.body["data"]["messages"]
        .as_array()
        .expect("messages array");
    let contents: Vec<&str> = messages
        .iter()
        .filter_map(|m| m["content"].as_str())
        .collect();
    assert_eq!(contents, ["message 2", "message 3", "message 4"]);
}

#[tokio::test]
async fn test_topic_messages_filters_by_topic() {
    let app = helpers::TestApp::new().await;
    let topic = TopicId::new();
    let message = ChatMessage::topic_reply(topic, UserId::from("bob"), "bob", "first!");
    app.hub.publish(message).await.expect("publish");
    app.hub
        .publish(ChatMessage::topic_reply(
            TopicId::new(),
            UserId::from("bob"),
            "bob",
            "elsewhere",
        ))
        .await
        .expect("publish");

    let response = app
        .request_as(
            "GET",
            &format!("/api/topics/{topic}/messages"),
            "token-alice",
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let messages = response.body["data"]["messages"]
        .as_array()
        .expect("messages array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "first!");
    assert_eq!(messages[0]["is_chat"], false);
}

#[tokio::test]
async fn test_topic_messages_rejects_bad_id() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request_as("GET", "/api/topics/not-a-uuid/messages", "token-alice")
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_topic_reply_stores_without_broadcast() {
    let app = helpers::TestApp::new().await;
    let (watcher_sink, mut watcher) = helpers::channel_sink();
    app.hub.register(UserId::from("watcher"), watcher_sink).await;
    assert_eq!(watcher.next_online_count().await, Some(1));
    let topic = TopicId::new();
    let path = format!("/api/topics/{topic}/messages");

    let response = app
        .post_json_as(&path, "token-bob", serde_json::json!({"content": "  great post  "}))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let data = &response.body["data"];
    assert_eq!(data["content"], "great post");
    assert_eq!(data["user_id"], "bob");
    assert_eq!(data["username"], "bob (display)");
    assert_eq!(data["topic_id"], topic.to_string());
    assert_eq!(data["is_chat"], false);

    let response = app.request_as("GET", &path, "token-alice").await;
    let messages = response.body["data"]["messages"]
        .as_array()
        .expect("messages array");
    assert_eq!(messages.len(), 1);
    assert!(watcher.next_chat().await.is_none());
}

#[tokio::test]
async fn test_post_topic_reply_rejects_bad_requests() {
    let app = helpers::TestApp::new().await;
    let path = format!("/api/topics/{}/messages", TopicId::new());

    let response = app
        .post_json_as(&path, "forged", serde_json::json!({"content": "hi"}))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .post_json_as(&path, "token-bob", serde_json::json!({"content": "   "}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");

    assert_eq!(app.persister.count().await, 0);
}

#[tokio::test]
async fn test_query_token_is_percent_decoded() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/chat/online?token=token-b%6Fb")
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Reads frames until one satisfies `pick`.
async fn next_matching(socket: &mut Socket, pick: impl Fn(&Value) -> bool) -> Value {
    let deadline = Duration::from_secs(3);
    tokio::time::timeout(deadline, async {
        loop {
            let message = socket
                .next()
                .await
                .expect("socket open")
                .expect("frame");
            if let Message::Text(text) = message {
                let value: Value = serde_json::from_str(text.as_str()).expect("json frame");
                if pick(&value) {
                    return value;
                }
            }
        }
    })
    .await
    .expect("frame within deadline")
}

#[tokio::test]
async fn test_websocket_chat_end_to_end() {
    let app = helpers::TestApp::new().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    let (mut alice, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token=token-alice"))
        .await
        .expect("alice connects");
    let first = next_matching(&mut alice, |v| v["type"] == "online_count").await;
    assert_eq!(first["count"], 1);

    let (mut bob, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token=token-bob"))
        .await
        .expect("bob connects");
    let count = next_matching(&mut alice, |v| v["type"] == "online_count").await;
    assert_eq!(count["count"], 2);

    bob.send(Message::text(r#"{"text":"hello from bob"}"#))
        .await
        .expect("bob sends");

    for socket in [&mut alice, &mut bob] {
        let chat = next_matching(socket, |v| v.get("type").is_none()).await;
        assert_eq!(chat["content"], "hello from bob");
        assert_eq!(chat["user_id"], "bob");
        assert_eq!(chat["username"], "bob (display)");
        assert_eq!(chat["is_chat"], true);
    }
    assert_eq!(app.persister.count().await, 1);

    bob.close(None).await.expect("bob closes");
    let count = next_matching(&mut alice, |v| v["type"] == "online_count").await;
    assert_eq!(count["count"], 1);

    app.hub.shutdown().await.expect("shutdown");
    assert_eq!(app.hub.current_count(), 0);
}
