//! Realtime gateway counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Gateway-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    notifications_enqueued: AtomicU64,
    notifications_pushed: AtomicU64,
    notifications_held: AtomicU64,
    notifications_dropped: AtomicU64,
    push_failures: AtomicU64,
}

impl RealtimeMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection was registered.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection was unregistered.
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// A notification entered the queue.
    pub fn notification_enqueued(&self) {
        self.notifications_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// A notification reached at least one live connection.
    pub fn notification_pushed(&self) {
        self.notifications_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// A notification was held for an offline recipient.
    pub fn notification_held(&self) {
        self.notifications_held.fetch_add(1, Ordering::Relaxed);
    }

    /// `count` notifications were discarded without being delivered.
    pub fn notifications_dropped(&self, count: u64) {
        self.notifications_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// A push to a single connection failed.
    pub fn push_failed(&self) {
        self.push_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        MetricsSnapshot {
            connections_opened: opened,
            connections_closed: closed,
            connections_active: opened.saturating_sub(closed),
            notifications_enqueued: self.notifications_enqueued.load(Ordering::Relaxed),
            notifications_pushed: self.notifications_pushed.load(Ordering::Relaxed),
            notifications_held: self.notifications_held.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever registered.
    pub connections_opened: u64,
    /// Connections ever unregistered.
    pub connections_closed: u64,
    /// Currently registered connections.
    pub connections_active: u64,
    /// Notifications accepted by the queue.
    pub notifications_enqueued: u64,
    /// Notifications delivered to at least one connection.
    pub notifications_pushed: u64,
    /// Notifications held for offline recipients.
    pub notifications_held: u64,
    /// Notifications discarded (queue full, buffer overflow, retention expiry).
    pub notifications_dropped: u64,
    /// Failed pushes to individual connections.
    pub push_failures: u64,
}
