//! Integration tests for notification persistence and realtime delivery.

mod helpers;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use socialhub_core::config::RealtimeConfig;
use socialhub_core::types::pagination::PageRequest;
use socialhub_entity::notification::NotificationType;
use socialhub_realtime::message::types::OutboundMessage;

use helpers::TestApp;

async fn next_frame(rx: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("connection closed")
}

fn seq(frame: &OutboundMessage) -> Option<u64> {
    match frame {
        OutboundMessage::Notification { data, .. } => data["seq"].as_u64(),
        _ => None,
    }
}

/// Waits until the dispatcher has drained everything queued so far.
async fn settle(app: &TestApp, expected_processed: u64) {
    timeout(Duration::from_secs(5), async {
        loop {
            let m = app.engine.metrics_snapshot();
            if m.notifications_pushed + m.notifications_held >= expected_processed {
                break;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("dispatcher did not settle");
}

#[tokio::test]
async fn test_notify_offline_keeps_record() {
    let mut app = TestApp::new();
    app.start_dispatcher();
    let user = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let created = app
        .notifications
        .notify(
            user,
            Some(actor),
            NotificationType::PostComment,
            serde_json::json!({ "post_id": 42 }),
        )
        .await
        .unwrap();
    settle(&app, 1).await;

    let page = app.notifications.list(user, PageRequest::default()).await.unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].id, created.id);
    assert_eq!(page.items[0].actor_id, Some(actor));
    assert_eq!(app.notifications.unread_count(user).await.unwrap(), 1);
    assert_eq!(app.engine.pending.pending_count(user), 1);
    app.shutdown();
}

#[tokio::test]
async fn test_live_connection_receives_notification() {
    let mut app = TestApp::new();
    app.start_dispatcher();
    let user = Uuid::new_v4();
    let (_conn, mut rx) = app.engine.connect(user, "phone");

    let created = app
        .notifications
        .notify(user, None, NotificationType::FriendRequest, serde_json::json!({}))
        .await
        .unwrap();

    match next_frame(&mut rx).await {
        OutboundMessage::Notification {
            id,
            notification_type,
            ..
        } => {
            assert_eq!(id, created.id);
            assert_eq!(notification_type, NotificationType::FriendRequest);
        }
        other => panic!("unexpected frame: {other:?}"),
    }
    app.shutdown();
}

#[tokio::test]
async fn test_dead_connection_does_not_block_live_one() {
    let mut app = TestApp::new();
    app.start_dispatcher();
    let user = Uuid::new_v4();
    let (_dead, dead_rx) = app.engine.connect(user, "tablet");
    let (_live, mut live_rx) = app.engine.connect(user, "phone");
    drop(dead_rx);

    for n in 0..3u64 {
        app.notifications
            .notify(user, None, NotificationType::Mention, serde_json::json!({ "seq": n }))
            .await
            .unwrap();
    }

    for n in 0..3u64 {
        assert_eq!(seq(&next_frame(&mut live_rx).await), Some(n));
    }
    assert_eq!(app.engine.connections.user_connections(user).len(), 1);
    assert!(app.engine.metrics_snapshot().push_failures >= 1);
    app.shutdown();
}

#[tokio::test]
async fn test_held_notifications_flushed_on_connect() {
    let mut app = TestApp::new();
    app.start_dispatcher();
    let user = Uuid::new_v4();

    for n in 0..3u64 {
        app.notifications
            .notify(user, None, NotificationType::PostReaction, serde_json::json!({ "seq": n }))
            .await
            .unwrap();
    }
    settle(&app, 3).await;

    let (_conn, mut rx) = app.engine.connect(user, "phone");
    app.notifications
        .notify(user, None, NotificationType::PostReaction, serde_json::json!({ "seq": 3 }))
        .await
        .unwrap();

    for n in 0..4u64 {
        assert_eq!(seq(&next_frame(&mut rx).await), Some(n));
    }
    assert_eq!(app.engine.pending.pending_count(user), 0);
    app.shutdown();
}

#[tokio::test]
async fn test_pending_buffer_is_bounded() {
    let mut app = TestApp::with_realtime(RealtimeConfig {
        max_pending_per_user: 2,
        ..RealtimeConfig::default()
    });
    let dispatcher = app.take_dispatcher().unwrap();
    let user = Uuid::new_v4();

    for n in 0..5u64 {
        let created = app
            .notifications
            .notify(user, None, NotificationType::System, serde_json::json!({ "seq": n }))
            .await
            .unwrap();
        dispatcher.dispatch(created);
    }

    assert_eq!(app.engine.pending.pending_count(user), 2);
    let (_conn, mut rx) = app.engine.connections.register(user, "phone");
    dispatcher.flush(user);

    assert_eq!(seq(&next_frame(&mut rx).await), Some(3));
    assert_eq!(seq(&next_frame(&mut rx).await), Some(4));

    let page = app.notifications.list(user, PageRequest::default()).await.unwrap();
    assert_eq!(page.total_items, 5);
}

#[tokio::test]
async fn test_held_notifications_expire() {
    let mut app = TestApp::new();
    let dispatcher = app.take_dispatcher().unwrap();
    let user = Uuid::new_v4();

    let created = app
        .notifications
        .notify(user, None, NotificationType::System, serde_json::json!({}))
        .await
        .unwrap();
    dispatcher.dispatch(created);

    app.clock.advance(chrono::Duration::seconds(301));
    assert_eq!(dispatcher.prune(), 1);
    assert_eq!(app.engine.pending.total(), 0);
    assert_eq!(app.notifications.unread_count(user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_full_queue_still_persists() {
    let app = TestApp::with_realtime(RealtimeConfig {
        queue_capacity: 1,
        ..RealtimeConfig::default()
    });
    let user = Uuid::new_v4();

    for _ in 0..3 {
        app.notifications
            .notify(user, None, NotificationType::PostShare, serde_json::json!({}))
            .await
            .unwrap();
    }

    let metrics = app.engine.metrics_snapshot();
    assert_eq!(metrics.notifications_enqueued, 1);
    assert_eq!(metrics.notifications_dropped, 2);
    assert_eq!(app.notifications.unread_count(user).await.unwrap(), 3);
}

#[tokio::test]
async fn test_mark_all_read_pushes_zero_unread() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    for _ in 0..2 {
        app.notifications
            .notify(user, None, NotificationType::Mention, serde_json::json!({}))
            .await
            .unwrap();
    }
    let (_conn, mut rx) = app.engine.connections.register(user, "phone");

    assert_eq!(app.notifications.mark_all_read(user).await.unwrap(), 2);
    assert_eq!(next_frame(&mut rx).await, OutboundMessage::UnreadCount { count: 0 });
    assert_eq!(app.notifications.unread_count(user).await.unwrap(), 0);
}
