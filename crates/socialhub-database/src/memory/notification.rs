//! In-memory notification repository.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use socialhub_core::result::AppResult;
use socialhub_core::types::pagination::{PageRequest, PageResponse};
use socialhub_entity::notification::{NewNotification, Notification};

use crate::repositories::NotificationRepository;

/// Notifications in insertion order.
#[derive(Debug, Default)]
pub struct MemoryNotificationRepository {
    rows: RwLock<Vec<Notification>>,
}

impl MemoryNotificationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn create(&self, data: &NewNotification) -> AppResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            actor_id: data.actor_id,
            notification_type: data.notification_type,
            data: data.data.clone(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let rows = self.rows.read().await;
        let owned: Vec<&Notification> = rows.iter().rev().filter(|n| n.user_id == user_id).collect();
        let total = owned.len() as u64;
        let items = owned
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(n) => {
                if !n.is_read {
                    n.is_read = true;
                    n.read_at = Some(Utc::now());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for n in rows.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
            n.is_read = true;
            n.read_at = Some(now);
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|n| n.user_id == user_id && !n.is_read).count() as i64)
    }
}
