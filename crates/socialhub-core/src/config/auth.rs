//! Access token signing configuration.

use serde::{Deserialize, Serialize};

/// Access token (JWT) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256). Rotating it invalidates
    /// every access token issued so far.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: u64,
    /// Clock-skew leeway applied when checking token expiry.
    #[serde(default = "default_leeway")]
    pub jwt_leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_ttl_seconds: default_access_ttl(),
            jwt_leeway_seconds: default_leeway(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    900
}

fn default_leeway() -> u64 {
    5
}
