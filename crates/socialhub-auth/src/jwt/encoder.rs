//! JWT access token creation.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use socialhub_core::config::AuthConfig;
use socialhub_core::error::{AppError, ErrorKind};
use socialhub_core::traits::Clock;

use super::claims::{Claims, TokenPayload};

/// Creates HS256-signed access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Source of `iat`.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            clock,
        }
    }

    /// Signs `payload` into a token that expires `ttl` from now.
    pub fn sign(&self, payload: &TokenPayload, ttl: Duration) -> Result<String, AppError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: payload.user_id,
            did: payload.device_id.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to sign access token", e))
    }
}
