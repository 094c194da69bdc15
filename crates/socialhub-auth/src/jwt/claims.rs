//! JWT claims structure used in access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: Uuid,
    /// Device the token was issued to.
    pub did: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
}

/// The identity an access token asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Authenticated user.
    pub user_id: Uuid,
    /// Device the user authenticated from.
    pub device_id: String,
}

impl TokenPayload {
    /// Create a payload for `(user_id, device_id)`.
    pub fn new(user_id: Uuid, device_id: impl Into<String>) -> Self {
        Self {
            user_id,
            device_id: device_id.into(),
        }
    }
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the expiration as a `DateTime<Utc>`, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the token is expired at `now`, allowing `leeway_seconds` of skew.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        now.timestamp() >= self.exp.saturating_add(leeway_seconds)
    }

    /// Strip the registered claims down to the asserted identity.
    pub fn into_payload(self) -> TokenPayload {
        TokenPayload {
            user_id: self.sub,
            device_id: self.did,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary_with_leeway() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            did: "d1".to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + 60,
            jti: Uuid::new_v4(),
        };

        assert!(!claims.is_expired_at(now, 0));
        assert!(claims.is_expired_at(now + chrono::Duration::seconds(60), 0));
        assert!(!claims.is_expired_at(now + chrono::Duration::seconds(60), 5));
        assert!(claims.is_expired_at(now + chrono::Duration::seconds(65), 5));
    }
}
