//! Application hook for client frames that change state.

use async_trait::async_trait;
use uuid::Uuid;

use socialhub_core::result::AppResult;

/// Handles inbound frames that touch persisted notifications.
///
/// Implemented by the notification service; the gateway only routes.
#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    /// The user marked one notification as read.
    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()>;

    /// The user marked all notifications as read.
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<()>;
}
