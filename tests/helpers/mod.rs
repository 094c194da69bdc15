//! Shared fixtures for integration tests: in-memory stores, a manual
//! clock and fully wired services.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use socialhub_auth::jwt::TokenSigner;
use socialhub_auth::session::{SessionCleanup, SessionManager, SessionStore};
use socialhub_core::config::{AuthConfig, RealtimeConfig, SessionConfig};
use socialhub_core::traits::{Clock, ManualClock};
use socialhub_database::memory::{MemoryNotificationRepository, MemorySessionRepository};
use socialhub_realtime::connection::WsAuthenticator;
use socialhub_realtime::ws::WsState;
use socialhub_realtime::{NotificationDispatcher, RealtimeEngine};
use socialhub_service::NotificationService;

/// Fixed starting instant so expiry arithmetic is exact.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Auth settings used by the tests.
pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        access_ttl_seconds: 900,
        jwt_leeway_seconds: 0,
    }
}

/// Fully wired application over in-memory stores.
pub struct TestApp {
    pub clock: Arc<ManualClock>,
    pub session_repo: Arc<MemorySessionRepository>,
    pub notification_repo: Arc<MemoryNotificationRepository>,
    pub sessions: Arc<SessionManager>,
    pub cleanup: SessionCleanup,
    pub engine: RealtimeEngine,
    pub notifications: Arc<NotificationService>,
    dispatcher: Option<NotificationDispatcher>,
    shutdown_tx: watch::Sender<bool>,
}

impl TestApp {
    /// App with default realtime settings.
    pub fn new() -> Self {
        Self::with_realtime(RealtimeConfig::default())
    }

    /// App with custom realtime settings.
    pub fn with_realtime(realtime: RealtimeConfig) -> Self {
        let clock = Arc::new(ManualClock::new(epoch()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let session_repo = Arc::new(MemorySessionRepository::new());
        let notification_repo = Arc::new(MemoryNotificationRepository::new());

        let signer = Arc::new(TokenSigner::new(&auth_config(), Arc::clone(&dyn_clock)));
        let store = Arc::new(SessionStore::new(session_repo.clone()));
        let sessions = Arc::new(SessionManager::new(
            signer,
            Arc::clone(&store),
            Arc::clone(&dyn_clock),
            SessionConfig::default(),
        ));
        let cleanup = SessionCleanup::new(store, Arc::clone(&dyn_clock));

        let (engine, dispatcher) = RealtimeEngine::new(&realtime, dyn_clock);
        let notifications = Arc::new(NotificationService::new(
            notification_repo.clone(),
            engine.clone(),
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            clock,
            session_repo,
            notification_repo,
            sessions,
            cleanup,
            engine,
            notifications,
            dispatcher: Some(dispatcher),
            shutdown_tx,
        }
    }

    /// Spawns the dispatcher. Returns `None` if it was already taken.
    pub fn start_dispatcher(&mut self) -> Option<JoinHandle<()>> {
        let dispatcher = self.dispatcher.take()?;
        Some(tokio::spawn(dispatcher.run(self.shutdown_tx.subscribe())))
    }

    /// Hands out the dispatcher for manual driving.
    pub fn take_dispatcher(&mut self) -> Option<NotificationDispatcher> {
        self.dispatcher.take()
    }

    /// Signals background tasks to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// State for the WebSocket router.
    pub fn ws_state(&self) -> WsState {
        WsState {
            engine: self.engine.clone(),
            authenticator: WsAuthenticator::new(Arc::clone(&self.sessions)),
            inbound: self.notifications.clone(),
        }
    }
}
