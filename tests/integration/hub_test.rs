//! Integration tests for the chat hub: fan-out, presence, eviction, liveness.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use futures::stream;

use forum_core::config::ChatConfig;
use forum_core::error::ErrorKind;
use forum_core::result::AppResult;
use forum_core::types::{ChatMessage, UserId};
use forum_realtime::connection::LivenessMonitor;
use forum_realtime::message::Envelope;
use forum_realtime::metrics::HubMetrics;
use forum_realtime::{ChatHub, InboundFrame, SessionEnd};

use helpers::{
    ExpiringAuth, FakeAuth, MemoryPersister, StalledSink, channel_sink, eventually, profile,
};

fn start_hub(config: &ChatConfig) -> (ChatHub, Arc<MemoryPersister>) {
    let persister = Arc::new(MemoryPersister::default());
    let hub = ChatHub::start(config, Arc::new(FakeAuth), persister.clone());
    (hub, persister)
}

#[tokio::test]
async fn test_chat_reaches_every_connection() {
    let (hub, _) = start_hub(&ChatConfig::default());
    let (alice_sink, mut alice) = channel_sink();
    let (bob_sink, mut bob) = channel_sink();

    hub.register(UserId::from("alice"), alice_sink).await;
    hub.register(UserId::from("bob"), bob_sink).await;

    assert!(hub.submit(ChatMessage::chat(UserId::from("carol"), "Carol", "hello").into()).await);

    for client in [&mut alice, &mut bob] {
        let frame = client.next_chat().await.expect("chat frame");
        assert_eq!(frame["content"], "hello");
        assert_eq!(frame["is_chat"], true);
    }

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_reregistration_keeps_one_entry() {
    let (hub, _) = start_hub(&ChatConfig::default());
    let alice = UserId::from("alice");
    let (first_sink, _first) = channel_sink();
    let (second_sink, _second) = channel_sink();

    let first = hub.register(alice.clone(), first_sink).await;
    let second = hub.register(alice.clone(), second_sink).await;

    assert_eq!(hub.current_count(), 1);
    let snapshot = hub.registry().snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].1.id, second.id);
    assert!(!first.is_alive());

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_failed_write_evicts_and_announces() {
    let (hub, _) = start_hub(&ChatConfig::default());
    let alice_id = UserId::from("alice");
    let (alice_sink, mut alice) = channel_sink();
    let (bob_sink, mut bob) = channel_sink();

    hub.register(alice_id.clone(), alice_sink).await;
    hub.register(UserId::from("bob"), bob_sink).await;
    assert_eq!(alice.next_online_count().await, Some(1));
    assert_eq!(alice.next_online_count().await, Some(2));
    assert_eq!(bob.next_online_count().await, Some(2));

    alice.break_transport();
    hub.submit(ChatMessage::chat(UserId::from("bob"), "Bob", "anyone there?").into())
        .await;

    let registry = Arc::clone(hub.registry());
    assert!(
        eventually(|| {
            let registry = Arc::clone(&registry);
            let alice_id = alice_id.clone();
            async move { registry.get(&alice_id).await.is_none() }
        })
        .await
    );

    assert_eq!(bob.next_chat().await.expect("chat")["content"], "anyone there?");
    assert_eq!(bob.next_online_count().await, Some(1));
    assert_eq!(hub.current_count(), 1);
    assert_eq!(hub.metrics().evictions, 1);

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_store_failure_blocks_broadcast() {
    let persister = Arc::new(MemoryPersister::failing());
    let hub = ChatHub::start(&ChatConfig::default(), Arc::new(FakeAuth), persister.clone());
    let (bob_sink, mut bob) = channel_sink();
    hub.register(UserId::from("bob"), bob_sink).await;

    let err = hub
        .handle_chat_message(&UserId::from("alice"), "hello")
        .await
        .expect_err("store fails");

    assert_eq!(err.kind, ErrorKind::Database);
    assert!(bob.next_chat().await.is_none());
    assert_eq!(hub.registry().len().await, 1);

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_liveness_probe_evicts_only_dead_connection() {
    let (hub, _) = start_hub(&ChatConfig::default());
    let (live_sink, _live) = channel_sink();
    let (dead_sink, mut dead) = channel_sink();

    hub.register(UserId::from("live"), live_sink).await;
    hub.register(UserId::from("dead"), dead_sink).await;
    assert_eq!(dead.next_online_count().await, Some(2));
    dead.break_transport();

    let monitor = LivenessMonitor::new(
        Arc::clone(hub.registry()),
        Arc::new(HubMetrics::new()),
        Duration::from_secs(300),
    );
    monitor.probe_once().await;

    let registry = Arc::clone(hub.registry());
    assert!(
        eventually(|| {
            let registry = Arc::clone(&registry);
            async move { registry.len().await == 1 }
        })
        .await
    );
    assert_eq!(hub.online_users().await, vec![UserId::from("live")]);

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_liveness_task_runs_on_schedule() {
    let config = ChatConfig {
        liveness_interval_seconds: 1,
        ..ChatConfig::default()
    };
    let (hub, _) = start_hub(&config);
    let (dead_sink, mut dead) = channel_sink();
    hub.register(UserId::from("dead"), dead_sink).await;
    assert_eq!(dead.next_online_count().await, Some(1));
    dead.break_transport();

    let registry = Arc::clone(hub.registry());
    assert!(
        eventually(|| {
            let registry = Arc::clone(&registry);
            async move { registry.is_empty().await }
        })
        .await
    );
    assert_eq!(hub.current_count(), 0);

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_presence_counts_follow_membership() {
    let (hub, _) = start_hub(&ChatConfig::default());
    let (alice_sink, mut alice) = channel_sink();
    let (bob_sink, _bob) = channel_sink();

    hub.register(UserId::from("alice"), alice_sink).await;
    assert_eq!(alice.next_online_count().await, Some(1));

    hub.register(UserId::from("bob"), bob_sink).await;
    assert_eq!(alice.next_online_count().await, Some(2));

    assert!(hub.unregister(&UserId::from("bob")).await);
    assert!(!hub.unregister(&UserId::from("bob")).await);
    assert_eq!(alice.next_online_count().await, Some(1));

    hub.submit(Envelope::ping()).await;
    assert_eq!(alice.next_frame().await.expect("ping")["type"], "ping");

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_session_persists_and_broadcasts() {
    let (hub, persister) = start_hub(&ChatConfig::default());
    let (watcher_sink, mut watcher) = channel_sink();
    hub.register(UserId::from("watcher"), watcher_sink).await;

    let (alice_sink, _alice) = channel_sink();
    let inbound = stream::iter(vec![
        Ok(InboundFrame::Text(r#"{"text":"hi all"}"#.to_string())),
        Ok(InboundFrame::Close),
    ]);
    let end = hub.serve_connection(profile("alice"), alice_sink, inbound).await;

    assert_eq!(end, SessionEnd::Closed);
    let frame = watcher.next_chat().await.expect("chat");
    assert_eq!(frame["content"], "hi all");
    assert_eq!(frame["username"], "alice (display)");
    assert_eq!(persister.count().await, 1);

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_shutdown_drains_then_closes_everyone() {
    let (hub, _) = start_hub(&ChatConfig::default());
    let (alice_sink, mut alice) = channel_sink();
    hub.register(UserId::from("alice"), alice_sink).await;

    hub.submit(ChatMessage::chat(UserId::from("bob"), "Bob", "last words").into())
        .await;
    hub.shutdown().await.expect("shutdown");

    assert_eq!(alice.next_chat().await.expect("drained")["content"], "last words");
    assert!(hub.registry().is_empty().await);
    assert_eq!(hub.current_count(), 0);
    assert!(!hub.submit(Envelope::ping()).await);
}

#[tokio::test]
async fn test_stalled_client_is_evicted_without_holding_back_others() {
    let config = ChatConfig {
        connection_buffer_size: 2,
        write_timeout_seconds: 1,
        ..ChatConfig::default()
    };
    let (hub, _) = start_hub(&config);
    let stalled = UserId::from("stalled");
    let (bob_sink, mut bob) = channel_sink();

    hub.register(stalled.clone(), StalledSink).await;
    hub.register(UserId::from("bob"), bob_sink).await;
    assert_eq!(bob.next_online_count().await, Some(2));

    for n in 0..4 {
        let text = format!("message {n}");
        let message = ChatMessage::chat(UserId::from("carol"), "Carol", text.clone());
        assert!(hub.submit(message.into()).await);
        assert_eq!(bob.next_chat().await.expect("chat")["content"], text.as_str());
    }

    let registry = Arc::clone(hub.registry());
    assert!(
        eventually(|| {
            let registry = Arc::clone(&registry);
            let stalled = stalled.clone();
            async move { registry.get(&stalled).await.is_none() }
        })
        .await
    );
    assert_eq!(bob.next_online_count().await, Some(1));
    assert_eq!(hub.current_count(), 1);
    assert_eq!(hub.online_users().await, vec![UserId::from("bob")]);
    assert_eq!(hub.metrics().evictions, 1);

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_session_keeps_admitted_profile_after_cache_expiry() {
    let auth = Arc::new(ExpiringAuth::default());
    let persister = Arc::new(MemoryPersister::default());
    let hub = ChatHub::start(&ChatConfig::default(), auth.clone(), persister.clone());
    let (watcher_sink, mut watcher) = channel_sink();
    hub.register(UserId::from("watcher"), watcher_sink).await;

    let author = hub.admit_profile(Some("token-alice")).await.expect("admitted");
    auth.expire();

    let (alice_sink, _alice) = channel_sink();
    let inbound = stream::iter(vec![
        Ok(InboundFrame::Text(r#"{"text":"still here"}"#.to_string())),
        Ok(InboundFrame::Close),
    ]);
    let end = hub.serve_connection(author, alice_sink, inbound).await;

    assert_eq!(end, SessionEnd::Closed);
    let frame = watcher.next_chat().await.expect("chat");
    assert_eq!(frame["content"], "still here");
    assert_eq!(frame["username"], "alice (display)");
    assert_eq!(persister.count().await, 1);

    hub.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_connection_after_shutdown_is_refused() {
    let (hub, _) = start_hub(&ChatConfig::default());
    hub.shutdown().await.expect("shutdown");

    let (alice_sink, _alice) = channel_sink();
    let end = hub
        .serve_connection(profile("alice"), alice_sink, stream::pending::<AppResult<InboundFrame>>())
        .await;

    assert_eq!(end, SessionEnd::Removed);
    assert!(hub.registry().is_empty().await);
    assert_eq!(hub.current_count(), 0);
}

#[tokio::test]
async fn test_zero_liveness_interval_does_not_panic() {
    let config = ChatConfig {
        liveness_interval_seconds: 0,
        ..ChatConfig::default()
    };
    let (hub, _) = start_hub(&config);
    let (alice_sink, mut alice) = channel_sink();
    hub.register(UserId::from("alice"), alice_sink).await;

    assert_eq!(alice.next_online_count().await, Some(1));
    let frame = alice.next_frame().await.expect("ping within two seconds");
    assert_eq!(frame["type"], "ping");

    hub.shutdown().await.expect("shutdown");
}
