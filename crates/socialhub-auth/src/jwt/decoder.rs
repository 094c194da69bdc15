//! JWT access token verification.
//!
//! Expiry is checked against the injected [`Clock`] rather than by
//! `jsonwebtoken`, which always reads the system time.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use socialhub_core::config::AuthConfig;
use socialhub_core::error::AppError;
use socialhub_core::traits::Clock;

use super::claims::{Claims, TokenPayload};

/// Validates access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration (signature and shape only).
    validation: Validation,
    /// Clock-skew allowance on `exp`.
    leeway_seconds: i64,
    /// Source of "now" for the expiry check.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            leeway_seconds: config.jwt_leeway_seconds as i64,
            clock,
        }
    }

    /// Decodes a token and checks its signature and expiry.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    JwtErrorKind::InvalidSignature => {
                        AppError::invalid_token("Invalid token signature")
                    }
                    JwtErrorKind::InvalidToken => AppError::invalid_token("Invalid token format"),
                    _ => AppError::invalid_token(format!("Token validation failed: {e}")),
                }
            })?;

        let claims = token_data.claims;
        if claims.is_expired_at(self.clock.now(), self.leeway_seconds) {
            return Err(AppError::token_expired("Token has expired"));
        }
        Ok(claims)
    }

    /// Verifies a token and returns the identity it asserts.
    pub fn verify(&self, token: &str) -> Result<TokenPayload, AppError> {
        self.decode_claims(token).map(Claims::into_payload)
    }
}
