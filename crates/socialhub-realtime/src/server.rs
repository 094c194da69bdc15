//! Top-level real-time engine that ties the gateway subsystems together.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use socialhub_core::config::RealtimeConfig;
use socialhub_core::traits::Clock;
use socialhub_entity::notification::Notification;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::manager::ConnectionManager;
use crate::message::types::OutboundMessage;
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::notification::dispatcher::{DispatchCommand, NotificationDispatcher};
use crate::notification::pending::PendingBuffer;
use crate::notification::queue::NotificationQueue;

/// Central real-time engine shared by the WebSocket endpoint and the
/// notification producers.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Producer side of the notification queue.
    pub queue: NotificationQueue,
    /// Held notifications of offline recipients.
    pub pending: Arc<PendingBuffer>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    control_tx: mpsc::UnboundedSender<DispatchCommand>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates the engine and the dispatcher that must be spawned to drain
    /// its queue.
    pub fn new(config: &RealtimeConfig, clock: Arc<dyn Clock>) -> (Self, NotificationDispatcher) {
        let metrics = Arc::new(RealtimeMetrics::new());
        let connections = Arc::new(ConnectionManager::new(config.clone(), metrics.clone()));
        let pending = Arc::new(PendingBuffer::new(
            config.max_pending_per_user,
            Duration::seconds(config.pending_retention_seconds as i64),
            clock,
        ));
        let (queue, queue_rx) = NotificationQueue::new(config.queue_capacity, metrics.clone());
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let dispatcher = NotificationDispatcher::new(
            queue_rx,
            control_rx,
            connections.clone(),
            pending.clone(),
            metrics.clone(),
            std::time::Duration::from_secs(config.prune_interval_seconds.max(1)),
        );

        info!("Real-time engine initialized");

        (
            Self {
                connections,
                queue,
                pending,
                metrics,
                control_tx,
            },
            dispatcher,
        )
    }

    /// Registers a connection and schedules delivery of anything held for
    /// the user.
    pub fn connect(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let registered = self.connections.register(user_id, device_id);
        if self
            .control_tx
            .send(DispatchCommand::Flush { user_id })
            .is_err()
        {
            debug!(user_id = %user_id, "Dispatcher not running, held notifications stay queued");
        }
        registered
    }

    /// Unregisters a connection. Safe to call more than once.
    pub fn disconnect(&self, conn_id: &ConnectionId) -> bool {
        self.connections.unregister(conn_id)
    }

    /// Queues a persisted notification for realtime delivery.
    pub fn enqueue(&self, notification: Notification) -> bool {
        self.queue.enqueue(notification)
    }

    /// Pushes a frame straight to the user's live connections, bypassing
    /// the queue. Returns how many connections accepted it.
    pub fn push_to_user(&self, user_id: Uuid, msg: &OutboundMessage) -> usize {
        self.connections.send_to_user(user_id, msg)
    }

    /// Current counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.connections.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use socialhub_core::traits::ManualClock;
    use socialhub_entity::notification::NotificationType;
    use tokio::sync::watch;

    fn notification(user_id: Uuid, seq: u32) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            actor_id: None,
            notification_type: NotificationType::PostReaction,
            data: serde_json::json!({ "seq": seq }),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    fn seq_of(msg: Option<OutboundMessage>) -> Option<u64> {
        match msg {
            Some(OutboundMessage::Notification { data, .. }) => data["seq"].as_u64(),
            _ => None,
        }
    }

    fn engine() -> (RealtimeEngine, NotificationDispatcher) {
        RealtimeEngine::new(
            &RealtimeConfig::default(),
            Arc::new(ManualClock::new(Utc::now())),
        )
    }

    #[tokio::test]
    async fn test_offline_items_flushed_on_connect_in_order() {
        let (engine, dispatcher) = engine();
        let user = Uuid::new_v4();

        dispatcher.dispatch(notification(user, 1));
        dispatcher.dispatch(notification(user, 2));
        assert_eq!(engine.pending.pending_count(user), 2);

        let (_conn, mut rx) = engine.connections.register(user, "d1");
        dispatcher.dispatch(notification(user, 3));
        dispatcher.flush(user);

        assert_eq!(seq_of(rx.recv().await), Some(1));
        assert_eq!(seq_of(rx.recv().await), Some(2));
        assert_eq!(seq_of(rx.recv().await), Some(3));
        assert_eq!(engine.metrics_snapshot().notifications_pushed, 3);
    }

    #[tokio::test]
    async fn test_running_dispatcher_delivers_and_stops() {
        let (engine, dispatcher) = engine();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(dispatcher.run(shutdown_rx));
        let user = Uuid::new_v4();

        assert!(engine.enqueue(notification(user, 1)));
        let (_conn, mut rx) = engine.connect(user, "d1");
        assert!(engine.enqueue(notification(user, 2)));

        assert_eq!(seq_of(rx.recv().await), Some(1));
        assert_eq!(seq_of(rx.recv().await), Some(2));

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_push_to_user_without_connections() {
        let (engine, _dispatcher) = engine();
        let delivered = engine.push_to_user(Uuid::new_v4(), &OutboundMessage::UnreadCount { count: 1 });
        assert_eq!(delivered, 0);
    }
}
