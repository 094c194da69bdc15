//! Notification dispatcher: the single consumer of the notification queue.
//!
//! Items are processed one at a time, so delivery to any recipient follows
//! enqueue order. A recipient with held items keeps accumulating into the
//! pending buffer until a flush drains it, which keeps held and fresh items
//! in order across a reconnect.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use socialhub_entity::notification::Notification;

use crate::connection::manager::ConnectionManager;
use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;

use super::pending::PendingBuffer;

/// Control messages for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCommand {
    /// A connection of `user_id` was registered; deliver held items.
    Flush {
        /// Recipient.
        user_id: Uuid,
    },
}

/// Drains the notification queue into live connections.
#[derive(Debug)]
pub struct NotificationDispatcher {
    queue_rx: mpsc::Receiver<Notification>,
    control_rx: mpsc::UnboundedReceiver<DispatchCommand>,
    connections: Arc<ConnectionManager>,
    pending: Arc<PendingBuffer>,
    metrics: Arc<RealtimeMetrics>,
    prune_interval: std::time::Duration,
}

impl NotificationDispatcher {
    /// Create a new dispatcher
    pub fn new(
        queue_rx: mpsc::Receiver<Notification>,
        control_rx: mpsc::UnboundedReceiver<DispatchCommand>,
        connections: Arc<ConnectionManager>,
        pending: Arc<PendingBuffer>,
        metrics: Arc<RealtimeMetrics>,
        prune_interval: std::time::Duration,
    ) -> Self {
        Self {
            queue_rx,
            control_rx,
            connections,
            pending,
            metrics,
            prune_interval,
        }
    }

    /// Deliver one notification, or hold it if the recipient has no live
    /// connection (or already has items waiting). Never fails.
    pub fn dispatch(&self, notification: Notification) {
        let user_id = notification.user_id;
        if self.pending.has_pending(user_id) {
            self.hold(notification);
            return;
        }

        let msg = OutboundMessage::notification(&notification);
        if self.connections.send_to_user(user_id, &msg) > 0 {
            self.metrics.notification_pushed();
        } else {
            self.hold(notification);
        }
    }

    /// Deliver everything held for `user_id`, oldest first.
    pub fn flush(&self, user_id: Uuid) {
        let (items, expired) = self.pending.take(user_id);
        if expired > 0 {
            self.metrics.notifications_dropped(expired as u64);
        }

        let mut items = items.into_iter();
        let mut delivered = 0usize;
        while let Some(held) = items.next() {
            let msg = OutboundMessage::notification(&held.notification);
            if self.connections.send_to_user(user_id, &msg) == 0 {
                // Went offline mid-flush.
                let mut rest = vec![held];
                rest.extend(items);
                self.pending.restore(user_id, rest);
                break;
            }
            self.metrics.notification_pushed();
            delivered += 1;
        }

        if delivered > 0 {
            debug!(user_id = %user_id, delivered = delivered, "Flushed held notifications");
        }
    }

    /// Discard held items past retention.
    pub fn prune(&self) -> usize {
        let pruned = self.pending.prune();
        if pruned > 0 {
            self.metrics.notifications_dropped(pruned as u64);
            debug!(pruned = pruned, "Pruned expired held notifications");
        }
        pruned
    }

    /// Run until `shutdown` flips to true or every producer is gone.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut prune_ticker = tokio::time::interval(self.prune_interval);
        prune_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("Notification dispatcher started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some(command) = self.control_rx.recv() => match command {
                    DispatchCommand::Flush { user_id } => self.flush(user_id),
                },
                item = self.queue_rx.recv() => match item {
                    Some(notification) => self.dispatch(notification),
                    None => break,
                },
                _ = prune_ticker.tick() => {
                    self.prune();
                }
            }
        }

        let held = self.pending.total();
        if held > 0 {
            warn!(held = held, "Dispatcher stopping with undelivered notifications");
        }
        info!("Notification dispatcher stopped");
    }

    fn hold(&self, notification: Notification) {
        let user_id = notification.user_id;
        let evicted = self.pending.hold(notification);
        self.metrics.notification_held();
        if evicted > 0 {
            warn!(
                user_id = %user_id,
                evicted = evicted,
                "Pending buffer full, dropped oldest notifications"
            );
            self.metrics.notifications_dropped(evicted as u64);
        }
    }
}
