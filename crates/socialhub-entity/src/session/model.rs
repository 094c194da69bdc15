//! Device session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One authenticated device binding for a user.
///
/// At most one row exists per `(user_id, device_id)`. The refresh token and
/// secret key are replaced on every re-authentication.
#[derive(Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceSession {
    /// Unique session identifier, stable across logins from the same device.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Client-supplied device identifier, unique per user.
    pub device_id: String,
    /// IP address the last login came from.
    pub ip_address: Option<String>,
    /// Current opaque refresh token.
    pub refresh_token: String,
    /// Auxiliary per-session secret, rotated alongside the refresh token.
    /// Stored but not yet validated anywhere.
    pub secret_key: String,
    /// Absolute expiry of the current refresh token.
    pub expired_at: DateTime<Utc>,
    /// When the device first logged in (or last re-logged in).
    pub created_at: DateTime<Utc>,
    /// Last login or refresh.
    pub last_active: DateTime<Utc>,
}

impl DeviceSession {
    /// Whether the refresh token is expired at `now`.
    ///
    /// The boundary instant counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("ip_address", &self.ip_address)
            .field("expired_at", &self.expired_at)
            .field("created_at", &self.created_at)
            .field("last_active", &self.last_active)
            .finish_non_exhaustive()
    }
}

/// Data written by a login: inserted for an unseen device, or overwriting
/// the existing row (keeping its `id`) for a known one.
#[derive(Clone, Serialize, Deserialize)]
pub struct UpsertDeviceSession {
    /// Owner.
    pub user_id: Uuid,
    /// Device identifier.
    pub device_id: String,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Freshly generated refresh token.
    pub refresh_token: String,
    /// Freshly generated secret key.
    pub secret_key: String,
    /// Refresh token expiry.
    pub expired_at: DateTime<Utc>,
    /// Login instant; becomes `created_at` and `last_active`.
    pub logged_in_at: DateTime<Utc>,
}

impl std::fmt::Debug for UpsertDeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpsertDeviceSession")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("ip_address", &self.ip_address)
            .field("expired_at", &self.expired_at)
            .finish_non_exhaustive()
    }
}

/// Replacement refresh material applied on re-authentication.
#[derive(Clone)]
pub struct RefreshRotation {
    /// New refresh token.
    pub refresh_token: String,
    /// New secret key.
    pub secret_key: String,
    /// New expiry.
    pub expired_at: DateTime<Utc>,
    /// Refresh instant; becomes `last_active`.
    pub rotated_at: DateTime<Utc>,
}

impl std::fmt::Debug for RefreshRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRotation")
            .field("expired_at", &self.expired_at)
            .field("rotated_at", &self.rotated_at)
            .finish_non_exhaustive()
    }
}
