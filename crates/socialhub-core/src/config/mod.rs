//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default so a partial file (or
//! none at all) still yields a usable configuration.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod realtime;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::auth::AuthConfig;
pub use self::database::{DatabaseConfig, DatabaseProvider};
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token signing settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Device session settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Real-time gateway settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// and environment variables prefixed with `SOCIALHUB__`
    /// (e.g. `SOCIALHUB__AUTH__JWT_SECRET`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SOCIALHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let raw = r#"
            [auth]
            jwt_secret = "test-secret"

            [session]
            refresh_expire_days = 7
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap();

        assert_eq!(config.auth.jwt_secret, "test-secret");
        assert_eq!(config.auth.access_ttl_seconds, 900);
        assert_eq!(config.session.refresh_expire_days, 7);
        assert_eq!(config.session.refresh_token_length, 64);
        assert_eq!(config.database.provider, DatabaseProvider::Postgres);
        assert_eq!(config.realtime.max_pending_per_user, 100);
    }
}
