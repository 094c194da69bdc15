//! WebSocket authentication: validates the access token before upgrade.

use std::sync::Arc;

use uuid::Uuid;

use socialhub_auth::session::SessionManager;
use socialhub_core::error::AppError;

/// Identity of an authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedConnection {
    /// User ID.
    pub user_id: Uuid,
    /// Device ID.
    pub device_id: String,
}

/// Authenticates connections with access tokens.
#[derive(Clone)]
pub struct WsAuthenticator {
    sessions: Arc<SessionManager>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    /// Verifies `token`. When the client also names its device, it must
    /// match the device the token was issued to.
    pub fn authenticate(
        &self,
        token: &str,
        device_id: Option<&str>,
    ) -> Result<AuthenticatedConnection, AppError> {
        let payload = self.sessions.verify_access_token(token)?;

        if let Some(device_id) = device_id {
            if device_id != payload.device_id {
                return Err(AppError::unauthorized(
                    "Token was issued to a different device",
                ));
            }
        }

        Ok(AuthenticatedConnection {
            user_id: payload.user_id,
            device_id: payload.device_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use socialhub_auth::jwt::TokenSigner;
    use socialhub_auth::session::{LoginMetadata, SessionStore};
    use socialhub_core::config::{AuthConfig, SessionConfig};
    use socialhub_core::error::ErrorKind;
    use socialhub_core::traits::ManualClock;
    use socialhub_database::memory::MemorySessionRepository;

    fn sessions() -> Arc<SessionManager> {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        Arc::new(SessionManager::new(
            Arc::new(TokenSigner::new(&AuthConfig::default(), clock.clone())),
            Arc::new(SessionStore::new(Arc::new(MemorySessionRepository::new()))),
            clock,
            SessionConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_device_must_match_token() {
        let sessions = sessions();
        let user = Uuid::new_v4();
        let tokens = sessions.login(user, LoginMetadata::new("d1")).await.unwrap();
        let auth = WsAuthenticator::new(sessions);

        let conn = auth.authenticate(&tokens.access_token, Some("d1")).unwrap();
        assert_eq!(conn.user_id, user);
        assert_eq!(auth.authenticate(&tokens.access_token, None).unwrap(), conn);

        let err = auth
            .authenticate(&tokens.access_token, Some("d2"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }
}
