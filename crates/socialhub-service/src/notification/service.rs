//! Notification creation, listing and read tracking.
//!
//! The store holds the durable record; realtime delivery is best effort
//! and never turns a successful write into an error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use socialhub_core::error::AppError;
use socialhub_core::result::AppResult;
use socialhub_core::types::pagination::{PageRequest, PageResponse};
use socialhub_database::repositories::NotificationRepository;
use socialhub_entity::notification::{NewNotification, Notification, NotificationType};
use socialhub_realtime::message::types::OutboundMessage;
use socialhub_realtime::{InboundHandler, RealtimeEngine};

/// Manages user notifications.
#[derive(Clone)]
pub struct NotificationService {
    /// Notification repository.
    repo: Arc<dyn NotificationRepository>,
    /// Realtime delivery.
    realtime: RealtimeEngine,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService").finish_non_exhaustive()
    }
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(repo: Arc<dyn NotificationRepository>, realtime: RealtimeEngine) -> Self {
        Self { repo, realtime }
    }

    /// Persists a notification for `recipient`, then queues it for
    /// realtime delivery. The persisted record is returned even if the
    /// queue drops it.
    pub async fn notify(
        &self,
        recipient: Uuid,
        actor: Option<Uuid>,
        notification_type: NotificationType,
        data: serde_json::Value,
    ) -> Result<Notification, AppError> {
        let notification = self
            .repo
            .create(&NewNotification {
                user_id: recipient,
                actor_id: actor,
                notification_type,
                data,
            })
            .await
            .map_err(|e| e.context("Failed to create notification"))?;

        let queued = self.realtime.enqueue(notification.clone());
        info!(
            notification_id = %notification.id,
            user_id = %recipient,
            notification_type = %notification_type,
            queued = queued,
            "Notification created"
        );

        Ok(notification)
    }

    /// Lists a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<Notification>, AppError> {
        self.repo
            .list_for_user(user_id, &page)
            .await
            .map_err(|e| e.context("Failed to list notifications"))
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.repo
            .count_unread(user_id)
            .await
            .map_err(|e| e.context("Failed to count unread"))
    }

    /// Marks a notification as read and pushes the new unread count to the
    /// user's live connections.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
        let updated = self
            .repo
            .mark_read(notification_id, user_id)
            .await
            .map_err(|e| e.context("Failed to mark read"))?;
        if !updated {
            return Err(AppError::not_found(format!(
                "Notification {notification_id} not found"
            )));
        }

        self.push_unread_count(user_id).await;
        Ok(())
    }

    /// Marks all notifications as read for the user.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let updated = self
            .repo
            .mark_all_read(user_id)
            .await
            .map_err(|e| e.context("Failed to mark all read"))?;

        self.push_unread_count(user_id).await;
        Ok(updated)
    }

    async fn push_unread_count(&self, user_id: Uuid) {
        match self.repo.count_unread(user_id).await {
            Ok(count) => {
                self.realtime
                    .push_to_user(user_id, &OutboundMessage::UnreadCount { count });
            }
            Err(e) => debug!(user_id = %user_id, error = %e, "Skipping unread count push"),
        }
    }
}

#[async_trait]
impl InboundHandler for NotificationService {
    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        NotificationService::mark_read(self, user_id, notification_id).await
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<()> {
        NotificationService::mark_all_read(self, user_id)
            .await
            .map(|_| ())
    }
}
