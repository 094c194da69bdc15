//! Session lifecycle manager: login, refresh token rotation, logout.
//!
//! Each device holds at most one session per user. Logging in again from
//! the same device replaces the refresh material in place; refreshing
//! swaps it under a compare-and-replace guard so a refresh token can be
//! spent at most once.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use socialhub_core::config::SessionConfig;
use socialhub_core::error::AppError;
use socialhub_core::traits::Clock;
use socialhub_entity::session::{DeviceSession, RefreshRotation, UpsertDeviceSession};

use crate::jwt::{TokenPayload, TokenSigner};
use crate::secret::{generate_refresh_token, generate_secret_key};

use super::store::SessionStore;

/// Credentials handed to the client after login or refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Short-lived signed access token.
    pub access_token: String,
    /// Opaque refresh token, valid for one rotation.
    pub refresh_token: String,
    /// Expiry of the refresh token.
    pub expired_at: DateTime<Utc>,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("expired_at", &self.expired_at)
            .finish_non_exhaustive()
    }
}

/// Where a login comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginMetadata {
    /// Client-supplied device identifier.
    pub device_id: String,
    /// Client IP address, if known.
    pub ip_address: Option<String>,
}

impl LoginMetadata {
    /// Metadata for `device_id` with no known IP address.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ip_address: None,
        }
    }

    /// Attach the client IP address.
    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

/// Refresh material generated for one login or rotation.
struct FreshSecrets {
    refresh_token: String,
    secret_key: String,
    expired_at: DateTime<Utc>,
}

/// Manages the device session lifecycle.
#[derive(Clone)]
pub struct SessionManager {
    /// Access token signer.
    signer: Arc<TokenSigner>,
    /// Session persistence.
    store: Arc<SessionStore>,
    /// Source of "now" for expiry decisions.
    clock: Arc<dyn Clock>,
    /// Session configuration.
    config: SessionConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        signer: Arc<TokenSigner>,
        store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            signer,
            store,
            clock,
            config,
        }
    }

    /// Logs `user_id` in from the device in `metadata`.
    ///
    /// Creates the device session, or replaces the refresh material of the
    /// existing one while keeping its id. Only store failures propagate.
    pub async fn login(
        &self,
        user_id: Uuid,
        metadata: LoginMetadata,
    ) -> Result<AuthTokens, AppError> {
        let existing = self
            .store
            .find_by_user_and_device(user_id, &metadata.device_id)
            .await?;

        let now = self.clock.now();
        let secrets = self.fresh_secrets(now);
        let access_token = self
            .signer
            .sign_access(&TokenPayload::new(user_id, metadata.device_id.clone()))?;

        let session = self
            .store
            .upsert(&UpsertDeviceSession {
                user_id,
                device_id: metadata.device_id,
                ip_address: metadata.ip_address,
                refresh_token: secrets.refresh_token.clone(),
                secret_key: secrets.secret_key,
                expired_at: secrets.expired_at,
                logged_in_at: now,
            })
            .await?;

        info!(
            user_id = %user_id,
            device_id = %session.device_id,
            session_id = %session.id,
            known_device = existing.is_some(),
            "Login successful"
        );

        Ok(AuthTokens {
            access_token,
            refresh_token: secrets.refresh_token,
            expired_at: secrets.expired_at,
        })
    }

    /// Exchanges a refresh token for new credentials.
    ///
    /// Fails with `InvalidRefresh` if the token is unknown on `device_id`,
    /// expired (the expiry instant itself counts as expired), or was spent
    /// by a concurrent refresh.
    pub async fn reauth(
        &self,
        refresh_token: &str,
        device_id: &str,
    ) -> Result<AuthTokens, AppError> {
        let session = self
            .store
            .find_by_refresh_token(device_id, refresh_token)
            .await?
            .ok_or_else(|| AppError::invalid_refresh("Refresh token not recognised"))?;

        let now = self.clock.now();
        if session.is_expired_at(now) {
            debug!(session_id = %session.id, "Refresh token expired");
            return Err(AppError::invalid_refresh("Refresh token has expired"));
        }

        let secrets = self.fresh_secrets(now);
        let access_token = self.signer.sign_access(&TokenPayload::new(
            session.user_id,
            session.device_id.clone(),
        ))?;

        let rotated = self
            .store
            .update_refresh(
                session.id,
                refresh_token,
                &RefreshRotation {
                    refresh_token: secrets.refresh_token.clone(),
                    secret_key: secrets.secret_key,
                    expired_at: secrets.expired_at,
                    rotated_at: now,
                },
            )
            .await?;

        if !rotated {
            warn!(
                session_id = %session.id,
                user_id = %session.user_id,
                "Refresh token was rotated concurrently"
            );
            return Err(AppError::invalid_refresh("Refresh token already used"));
        }

        info!(
            user_id = %session.user_id,
            device_id = %session.device_id,
            "Refresh token rotated"
        );

        Ok(AuthTokens {
            access_token,
            refresh_token: secrets.refresh_token,
            expired_at: secrets.expired_at,
        })
    }

    /// Ends the session of `(user_id, device_id)`.
    ///
    /// Already issued access tokens stay valid until they expire.
    pub async fn logout(&self, user_id: Uuid, device_id: &str) -> Result<(), AppError> {
        let removed = self.store.delete(user_id, device_id).await?;
        if removed == 0 {
            return Err(AppError::persistence(format!(
                "Session did not exist for device {device_id}"
            )));
        }
        info!(user_id = %user_id, device_id = %device_id, "Logged out");
        Ok(())
    }

    /// Verifies an access token. Every failure is reported as `Unauthorized`.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenPayload, AppError> {
        self.signer.verify(token).map_err(|e| {
            debug!(kind = %e.kind, error = %e.message, "Access token rejected");
            AppError::unauthorized(e.message)
        })
    }

    /// All devices the user is logged in from, most recently active first.
    pub async fn sessions_for_user(&self, user_id: Uuid) -> Result<Vec<DeviceSession>, AppError> {
        self.store.list_by_user(user_id).await
    }

    /// The session of one device, if any.
    pub async fn find_session(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> Result<Option<DeviceSession>, AppError> {
        self.store.find_by_user_and_device(user_id, device_id).await
    }

    fn fresh_secrets(&self, now: DateTime<Utc>) -> FreshSecrets {
        FreshSecrets {
            refresh_token: generate_refresh_token(self.config.refresh_token_length),
            secret_key: generate_secret_key(self.config.secret_key_length),
            expired_at: now + Duration::days(i64::from(self.config.refresh_expire_days)),
        }
    }
}
