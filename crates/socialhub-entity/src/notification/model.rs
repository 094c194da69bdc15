//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::NotificationType;

/// A notification persisted for a recipient.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient user.
    pub user_id: Uuid,
    /// The user whose activity triggered this notification (if any).
    pub actor_id: Option<Uuid>,
    /// What happened.
    pub notification_type: NotificationType,
    /// Event-specific data (post id, comment excerpt, ...).
    pub data: serde_json::Value,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When it was read.
    pub read_at: Option<DateTime<Utc>>,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Check if the notification has been read.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}

/// Data required to create a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// The recipient user.
    pub user_id: Uuid,
    /// The triggering user.
    pub actor_id: Option<Uuid>,
    /// What happened.
    pub notification_type: NotificationType,
    /// Event-specific data.
    pub data: serde_json::Value,
}
