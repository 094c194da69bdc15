//! Notification repository.
//!
//! Rows live in `notifications`, indexed by `(user_id, created_at)` for
//! newest-first listing.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use socialhub_core::error::{AppError, ErrorKind};
use socialhub_core::result::AppResult;
use socialhub_core::types::pagination::{PageRequest, PageResponse};
use socialhub_entity::notification::{NewNotification, Notification};

/// Persistence contract for notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync + 'static {
    /// Persist a notification, assigning its id and creation time.
    async fn create(&self, data: &NewNotification) -> AppResult<Notification>;

    /// List a recipient's notifications, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Mark one of the recipient's notifications as read. Returns `false`
    /// if no such notification belongs to the recipient.
    async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Mark all of a recipient's notifications as read.
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;

    /// Count a recipient's unread notifications.
    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64>;
}

/// PostgreSQL-backed [`NotificationRepository`].
#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, data: &NewNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, actor_id, notification_type, data) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, actor_id, notification_type, data, is_read, read_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.actor_id)
        .bind(data.notification_type)
        .bind(&data.data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to create notification", e)
        })
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to count notifications", e)
            })?;

        let items = sqlx::query_as::<_, Notification>(
            "SELECT id, user_id, actor_id, notification_type, data, is_read, read_at, created_at \
             FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to list notifications", e)
        })?;

        Ok(PageResponse::new(
            items,
            page.page,
            page.page_size,
            total.max(0) as u64,
        ))
    }

    async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to mark read", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to count unread", e))
    }
}
