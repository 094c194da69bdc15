//! Bounded hand-off between notification producers and the dispatcher.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use socialhub_entity::notification::Notification;

use crate::metrics::RealtimeMetrics;

/// Producer side of the notification queue.
///
/// Cloned freely; every clone feeds the same single dispatcher, so items
/// from one producer are delivered in the order they were enqueued.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<Notification>,
    metrics: Arc<RealtimeMetrics>,
}

impl NotificationQueue {
    /// Creates a queue holding at most `capacity` items, returning the
    /// consumer end for the dispatcher.
    pub fn new(
        capacity: usize,
        metrics: Arc<RealtimeMetrics>,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, metrics }, rx)
    }

    /// Hands `notification` to the dispatcher without waiting.
    ///
    /// Returns `false` if the queue is full or the dispatcher has stopped;
    /// the item is then dropped. The persisted record is unaffected.
    pub fn enqueue(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => {
                self.metrics.notification_enqueued();
                true
            }
            Err(mpsc::error::TrySendError::Full(n)) => {
                warn!(
                    notification_id = %n.id,
                    user_id = %n.user_id,
                    "Notification queue full, dropping realtime delivery"
                );
                self.metrics.notifications_dropped(1);
                false
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                warn!(
                    notification_id = %n.id,
                    user_id = %n.user_id,
                    "Notification dispatcher stopped, dropping realtime delivery"
                );
                self.metrics.notifications_dropped(1);
                false
            }
        }
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Whether the dispatcher has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use socialhub_entity::notification::NotificationType;
    use uuid::Uuid;

    fn notification() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            actor_id: None,
            notification_type: NotificationType::System,
            data: serde_json::json!({}),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let metrics = Arc::new(RealtimeMetrics::new());
        let (queue, mut rx) = NotificationQueue::new(1, metrics.clone());
        let first = notification();

        assert!(queue.enqueue(first.clone()));
        assert!(!queue.enqueue(notification()));
        assert_eq!(rx.recv().await.map(|n| n.id), Some(first.id));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.notifications_enqueued, 1);
        assert_eq!(snapshot.notifications_dropped, 1);
    }

    #[test]
    fn test_closed_queue_drops() {
        let (queue, rx) = NotificationQueue::new(4, Arc::new(RealtimeMetrics::new()));
        drop(rx);

        assert!(queue.is_closed());
        assert!(!queue.enqueue(notification()));
    }
}
