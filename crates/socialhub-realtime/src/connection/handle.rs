//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

use crate::message::types::OutboundMessage;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Why a push to one connection failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The connection was already closed.
    Closed,
    /// The outbound buffer is full.
    Full,
}

/// A handle to a single live connection.
///
/// Holds the sender side of the connection's outbound buffer. The socket
/// task owns the receiver and watches [`ConnectionHandle::closed`].
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: Uuid,
    /// Device the user connected from
    pub device_id: String,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<OutboundMessage>,
    alive: AtomicBool,
    close_signal: Notify,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(
        user_id: Uuid,
        device_id: impl Into<String>,
        sender: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            device_id: device_id.into(),
            connected_at: Utc::now(),
            sender,
            alive: AtomicBool::new(true),
            close_signal: Notify::new(),
        }
    }

    /// Push a message without waiting.
    ///
    /// Any failure marks this connection dead; other connections are
    /// unaffected.
    pub fn push(&self, msg: OutboundMessage) -> Result<(), PushError> {
        if !self.is_alive() {
            return Err(PushError::Closed);
        }
        match self.sender.try_send(msg) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Outbound buffer full, closing connection");
                self.close();
                Err(PushError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(PushError::Closed)
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Mark the connection dead and ask its socket task to shut down.
    pub fn close(&self) {
        self.mark_dead();
        self.close_signal.notify_one();
    }

    /// Resolves once [`ConnectionHandle::close`] has been called.
    pub async fn closed(&self) {
        self.close_signal.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(Uuid::new_v4(), "d1", tx);

        handle.push(OutboundMessage::UnreadCount { count: 1 }).unwrap();
        handle.push(OutboundMessage::UnreadCount { count: 2 }).unwrap();

        assert_eq!(rx.recv().await, Some(OutboundMessage::UnreadCount { count: 1 }));
        assert_eq!(rx.recv().await, Some(OutboundMessage::UnreadCount { count: 2 }));
    }

    #[tokio::test]
    async fn test_dropped_receiver_marks_dead() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(Uuid::new_v4(), "d1", tx);
        drop(rx);

        let err = handle
            .push(OutboundMessage::UnreadCount { count: 1 })
            .unwrap_err();
        assert_eq!(err, PushError::Closed);
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_full_buffer_closes() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(Uuid::new_v4(), "d1", tx);

        handle.push(OutboundMessage::UnreadCount { count: 1 }).unwrap();
        let err = handle
            .push(OutboundMessage::UnreadCount { count: 2 })
            .unwrap_err();
        assert_eq!(err, PushError::Full);

        handle.closed().await;
        assert!(!handle.is_alive());
    }
}
