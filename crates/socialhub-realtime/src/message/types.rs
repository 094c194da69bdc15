//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use socialhub_entity::notification::{Notification, NotificationType};

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Mark a notification as read.
    MarkRead {
        /// Notification ID.
        notification_id: Uuid,
    },
    /// Mark every notification as read.
    MarkAllRead,
    /// Application-level keepalive.
    Ping {
        /// Client timestamp, echoed back.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Notification delivery.
    Notification {
        /// Notification ID.
        id: Uuid,
        /// Triggering user.
        actor_id: Option<Uuid>,
        /// What happened.
        notification_type: NotificationType,
        /// Event payload.
        data: serde_json::Value,
        /// When the notification was created.
        created_at: DateTime<Utc>,
    },
    /// Current unread notification count.
    UnreadCount {
        /// Unread count.
        count: i64,
    },
    /// Reply to a client ping.
    Pong {
        /// Echoed client timestamp.
        timestamp: Option<i64>,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Frame for a persisted notification.
    pub fn notification(notification: &Notification) -> Self {
        Self::Notification {
            id: notification.id,
            actor_id: notification.actor_id,
            notification_type: notification.notification_type,
            data: notification.data.clone(),
            created_at: notification.created_at,
        }
    }

    /// Error frame.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
