//! Per-user buffer of notifications awaiting a live connection.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use socialhub_core::traits::Clock;
use socialhub_entity::notification::Notification;

/// A notification waiting for its recipient to connect.
#[derive(Debug, Clone)]
pub struct HeldNotification {
    /// The notification.
    pub notification: Notification,
    /// When it was put on hold.
    pub held_at: DateTime<Utc>,
}

/// Undelivered notifications keyed by recipient.
///
/// Each recipient holds at most `max_per_user` items (oldest evicted
/// first); items older than the retention window are discarded.
pub struct PendingBuffer {
    entries: DashMap<Uuid, VecDeque<HeldNotification>>,
    max_per_user: usize,
    retention: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PendingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingBuffer")
            .field("users", &self.entries.len())
            .field("max_per_user", &self.max_per_user)
            .field("retention", &self.retention)
            .finish()
    }
}

impl PendingBuffer {
    /// Creates an empty buffer.
    pub fn new(max_per_user: usize, retention: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            max_per_user,
            retention,
            clock,
        }
    }

    /// Holds `notification` for its recipient. Returns how many items were
    /// evicted to stay within the per-user bound.
    pub fn hold(&self, notification: Notification) -> usize {
        if self.max_per_user == 0 {
            return 1;
        }
        let held = HeldNotification {
            notification,
            held_at: self.clock.now(),
        };
        let mut queue = self.entries.entry(held.notification.user_id).or_default();
        queue.push_back(held);

        let mut evicted = 0;
        while queue.len() > self.max_per_user {
            queue.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Removes everything held for `user_id`, returning the items still
    /// within retention (oldest first) and the number that had expired.
    pub fn take(&self, user_id: Uuid) -> (Vec<HeldNotification>, usize) {
        let Some((_, queue)) = self.entries.remove(&user_id) else {
            return (Vec::new(), 0);
        };
        let now = self.clock.now();
        let total = queue.len();
        let live: Vec<HeldNotification> = queue
            .into_iter()
            .filter(|held| !self.is_expired(held, now))
            .collect();
        let expired = total - live.len();
        (live, expired)
    }

    /// Puts previously taken items back in front of anything held since.
    pub fn restore(&self, user_id: Uuid, items: Vec<HeldNotification>) {
        if items.is_empty() {
            return;
        }
        let mut queue = self.entries.entry(user_id).or_default();
        for held in items.into_iter().rev() {
            queue.push_front(held);
        }
        while queue.len() > self.max_per_user {
            queue.pop_front();
        }
    }

    /// Whether anything is held for `user_id`.
    pub fn has_pending(&self, user_id: Uuid) -> bool {
        self.entries
            .get(&user_id)
            .is_some_and(|queue| !queue.is_empty())
    }

    /// Number of items held for `user_id`.
    pub fn pending_count(&self, user_id: Uuid) -> usize {
        self.entries.get(&user_id).map_or(0, |queue| queue.len())
    }

    /// Total number of held items.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// Discards items past retention, returning how many were removed.
    pub fn prune(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, queue| {
            let before = queue.len();
            queue.retain(|held| !self.is_expired(held, now));
            removed += before - queue.len();
            !queue.is_empty()
        });
        removed
    }

    fn is_expired(&self, held: &HeldNotification, now: DateTime<Utc>) -> bool {
        held.held_at + self.retention <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialhub_core::traits::ManualClock;
    use socialhub_entity::notification::NotificationType;

    fn notification(user_id: Uuid, seq: u32) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            actor_id: None,
            notification_type: NotificationType::Mention,
            data: serde_json::json!({ "seq": seq }),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_bounded_drops_oldest() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let buffer = PendingBuffer::new(2, Duration::seconds(300), clock);
        let user = Uuid::new_v4();

        assert_eq!(buffer.hold(notification(user, 1)), 0);
        assert_eq!(buffer.hold(notification(user, 2)), 0);
        assert_eq!(buffer.hold(notification(user, 3)), 1);

        let (items, expired) = buffer.take(user);
        assert_eq!(expired, 0);
        let seqs: Vec<_> = items.iter().map(|h| h.notification.data["seq"].clone()).collect();
        assert_eq!(seqs, vec![serde_json::json!(2), serde_json::json!(3)]);
        assert!(!buffer.has_pending(user));
    }

    #[test]
    fn test_retention_expiry() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let buffer = PendingBuffer::new(10, Duration::seconds(60), clock.clone());
        let user = Uuid::new_v4();

        buffer.hold(notification(user, 1));
        clock.advance(Duration::seconds(30));
        buffer.hold(notification(user, 2));
        clock.advance(Duration::seconds(30));

        assert_eq!(buffer.prune(), 1);
        assert_eq!(buffer.pending_count(user), 1);

        clock.advance(Duration::seconds(30));
        let (items, expired) = buffer.take(user);
        assert!(items.is_empty());
        assert_eq!(expired, 1);
        assert_eq!(buffer.total(), 0);
    }

    #[test]
    fn test_restore_keeps_order() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let buffer = PendingBuffer::new(10, Duration::seconds(60), clock);
        let user = Uuid::new_v4();

        buffer.hold(notification(user, 1));
        buffer.hold(notification(user, 2));
        let (items, _) = buffer.take(user);
        buffer.hold(notification(user, 3));
        buffer.restore(user, items);

        let (items, _) = buffer.take(user);
        let seqs: Vec<_> = items.iter().map(|h| h.notification.data["seq"].clone()).collect();
        assert_eq!(
            seqs,
            vec![serde_json::json!(1), serde_json::json!(2), serde_json::json!(3)]
        );
    }
}
