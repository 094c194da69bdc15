//! Device session persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use socialhub_core::error::AppError;
use socialhub_database::repositories::SessionRepository;
use socialhub_entity::session::{DeviceSession, RefreshRotation, UpsertDeviceSession};

/// Session store over the configured [`SessionRepository`].
#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a new session store.
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        Self { repo }
    }

    /// Finds the session bound to `(user_id, device_id)`.
    pub async fn find_by_user_and_device(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> Result<Option<DeviceSession>, AppError> {
        self.repo
            .find_by_user_and_device(user_id, device_id)
            .await
            .map_err(|e| e.context(format!("Session lookup for user {user_id}")))
    }

    /// Finds the session currently holding `refresh_token` on `device_id`.
    pub async fn find_by_refresh_token(
        &self,
        device_id: &str,
        refresh_token: &str,
    ) -> Result<Option<DeviceSession>, AppError> {
        self.repo
            .find_by_refresh_token(device_id, refresh_token)
            .await
            .map_err(|e| e.context("Refresh token lookup"))
    }

    /// Lists all sessions of a user.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<DeviceSession>, AppError> {
        self.repo
            .find_by_user(user_id)
            .await
            .map_err(|e| e.context(format!("Session listing for user {user_id}")))
    }

    /// Inserts or overwrites the session for `(user_id, device_id)`.
    pub async fn upsert(&self, data: &UpsertDeviceSession) -> Result<DeviceSession, AppError> {
        self.repo
            .upsert(data)
            .await
            .map_err(|e| e.context(format!("Session upsert for user {}", data.user_id)))
    }

    /// Replaces refresh material if the row still holds `expected_refresh_token`.
    pub async fn update_refresh(
        &self,
        session_id: Uuid,
        expected_refresh_token: &str,
        rotation: &RefreshRotation,
    ) -> Result<bool, AppError> {
        self.repo
            .update_refresh(session_id, expected_refresh_token, rotation)
            .await
            .map_err(|e| e.context(format!("Refresh rotation for session {session_id}")))
    }

    /// Deletes the session for `(user_id, device_id)`.
    pub async fn delete(&self, user_id: Uuid, device_id: &str) -> Result<u64, AppError> {
        self.repo
            .delete(user_id, device_id)
            .await
            .map_err(|e| e.context(format!("Session delete for user {user_id}")))
    }

    /// Deletes every session expired at `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.repo
            .delete_expired(now)
            .await
            .map_err(|e| e.context("Expired session sweep"))
    }
}
