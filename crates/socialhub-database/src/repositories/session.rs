//! Device session repository.
//!
//! Rows live in `device_sessions`, unique on `(user_id, device_id)` and on
//! `refresh_token`. Every mutation is a single statement so concurrent
//! logins or refreshes for the same device never interleave.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use socialhub_core::error::{AppError, ErrorKind};
use socialhub_core::result::AppResult;
use socialhub_entity::session::{DeviceSession, RefreshRotation, UpsertDeviceSession};

/// Persistence contract for device sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Find the session bound to `(user_id, device_id)`.
    async fn find_by_user_and_device(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> AppResult<Option<DeviceSession>>;

    /// Find the session currently holding `refresh_token` on `device_id`.
    async fn find_by_refresh_token(
        &self,
        device_id: &str,
        refresh_token: &str,
    ) -> AppResult<Option<DeviceSession>>;

    /// All sessions of a user, most recently active first.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<DeviceSession>>;

    /// Insert a new session, or overwrite the one already bound to
    /// `(user_id, device_id)` while keeping its id.
    async fn upsert(&self, data: &UpsertDeviceSession) -> AppResult<DeviceSession>;

    /// Replace refresh material, but only while the row still carries
    /// `expected_refresh_token`. Returns `false` when it does not (the
    /// token was rotated concurrently or the row is gone).
    async fn update_refresh(
        &self,
        session_id: Uuid,
        expected_refresh_token: &str,
        rotation: &RefreshRotation,
    ) -> AppResult<bool>;

    /// Delete the session bound to `(user_id, device_id)`, returning rows removed.
    async fn delete(&self, user_id: Uuid, device_id: &str) -> AppResult<u64>;

    /// Delete every session whose refresh token expired at or before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// PostgreSQL-backed [`SessionRepository`].
#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_by_user_and_device(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> AppResult<Option<DeviceSession>> {
        sqlx::query_as::<_, DeviceSession>(
            "SELECT id, user_id, device_id, ip_address, refresh_token, secret_key, \
             expired_at, created_at, last_active \
             FROM device_sessions WHERE user_id = $1 AND device_id = $2",
        )
        .bind(user_id)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to find session", e))
    }

    async fn find_by_refresh_token(
        &self,
        device_id: &str,
        refresh_token: &str,
    ) -> AppResult<Option<DeviceSession>> {
        sqlx::query_as::<_, DeviceSession>(
            "SELECT id, user_id, device_id, ip_address, refresh_token, secret_key, \
             expired_at, created_at, last_active \
             FROM device_sessions WHERE device_id = $1 AND refresh_token = $2",
        )
        .bind(device_id)
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                "Failed to find session by refresh token",
                e,
            )
        })
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<DeviceSession>> {
        sqlx::query_as::<_, DeviceSession>(
            "SELECT id, user_id, device_id, ip_address, refresh_token, secret_key, \
             expired_at, created_at, last_active \
             FROM device_sessions WHERE user_id = $1 ORDER BY last_active DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to list user sessions", e)
        })
    }

    async fn upsert(&self, data: &UpsertDeviceSession) -> AppResult<DeviceSession> {
        sqlx::query_as::<_, DeviceSession>(
            "INSERT INTO device_sessions \
             (id, user_id, device_id, ip_address, refresh_token, secret_key, expired_at, created_at, last_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             ON CONFLICT (user_id, device_id) DO UPDATE SET \
             ip_address = EXCLUDED.ip_address, \
             refresh_token = EXCLUDED.refresh_token, \
             secret_key = EXCLUDED.secret_key, \
             expired_at = EXCLUDED.expired_at, \
             created_at = EXCLUDED.created_at, \
             last_active = EXCLUDED.last_active \
             RETURNING id, user_id, device_id, ip_address, refresh_token, secret_key, \
             expired_at, created_at, last_active",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(&data.device_id)
        .bind(&data.ip_address)
        .bind(&data.refresh_token)
        .bind(&data.secret_key)
        .bind(data.expired_at)
        .bind(data.logged_in_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to upsert session", e))
    }

    async fn update_refresh(
        &self,
        session_id: Uuid,
        expected_refresh_token: &str,
        rotation: &RefreshRotation,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE device_sessions SET refresh_token = $3, secret_key = $4, expired_at = $5, \
             last_active = $6 WHERE id = $1 AND refresh_token = $2",
        )
        .bind(session_id)
        .bind(expected_refresh_token)
        .bind(&rotation.refresh_token)
        .bind(&rotation.secret_key)
        .bind(rotation.expired_at)
        .bind(rotation.rotated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to rotate refresh token", e)
        })?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, user_id: Uuid, device_id: &str) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM device_sessions WHERE user_id = $1 AND device_id = $2")
                .bind(user_id)
                .bind(device_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Persistence, "Failed to delete session", e)
                })?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM device_sessions WHERE expired_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Persistence,
                    "Failed to delete expired sessions",
                    e,
                )
            })?;
        Ok(result.rows_affected())
    }
}
