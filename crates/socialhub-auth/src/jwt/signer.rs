//! Access token signer.

use std::sync::Arc;

use chrono::Duration;

use socialhub_core::config::AuthConfig;
use socialhub_core::error::AppError;
use socialhub_core::traits::Clock;

use super::claims::TokenPayload;
use super::decoder::JwtDecoder;
use super::encoder::JwtEncoder;

/// Issues and verifies access tokens with one shared secret.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    access_ttl: Duration,
}

impl TokenSigner {
    /// Builds a signer from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoder: JwtEncoder::new(config, Arc::clone(&clock)),
            decoder: JwtDecoder::new(config, clock),
            access_ttl: Duration::seconds(config.access_ttl_seconds as i64),
        }
    }

    /// Configured access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Signs `payload` with an explicit lifetime.
    pub fn sign(&self, payload: &TokenPayload, ttl: Duration) -> Result<String, AppError> {
        self.encoder.sign(payload, ttl)
    }

    /// Signs `payload` with the configured access token lifetime.
    pub fn sign_access(&self, payload: &TokenPayload) -> Result<String, AppError> {
        self.encoder.sign(payload, self.access_ttl)
    }

    /// Verifies `token`: `InvalidToken` on a bad signature or shape,
    /// `TokenExpired` once the expiry (plus leeway) has passed.
    pub fn verify(&self, token: &str) -> Result<TokenPayload, AppError> {
        self.decoder.verify(token)
    }
}
