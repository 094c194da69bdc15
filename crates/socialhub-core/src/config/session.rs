//! Device session configuration.

use serde::{Deserialize, Serialize};

/// Device session (refresh token) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Refresh token lifetime in days, counted from login or the last refresh.
    #[serde(default = "default_refresh_expire_days")]
    pub refresh_expire_days: u32,
    /// Length of the per-session auxiliary secret key.
    #[serde(default = "default_secret_key_length")]
    pub secret_key_length: usize,
    /// Length of the opaque refresh token.
    #[serde(default = "default_refresh_token_length")]
    pub refresh_token_length: usize,
    /// Interval between expired-session sweeps in minutes (0 disables the sweep).
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_expire_days: default_refresh_expire_days(),
            secret_key_length: default_secret_key_length(),
            refresh_token_length: default_refresh_token_length(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

fn default_refresh_expire_days() -> u32 {
    30
}

fn default_secret_key_length() -> usize {
    16
}

fn default_refresh_token_length() -> usize {
    64
}

fn default_cleanup_interval() -> u64 {
    60
}
