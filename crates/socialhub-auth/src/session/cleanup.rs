//! Expired session cleanup.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use socialhub_core::error::AppError;
use socialhub_core::traits::Clock;

use super::store::SessionStore;

/// Deletes device sessions whose refresh token has expired.
#[derive(Clone)]
pub struct SessionCleanup {
    /// Session store.
    store: Arc<SessionStore>,
    /// Source of "now".
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup").finish()
    }
}

impl SessionCleanup {
    /// Creates a new session cleanup handler.
    pub fn new(store: Arc<SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Runs one cleanup cycle, returning the number of sessions removed.
    pub async fn run_cleanup(&self) -> Result<u64, AppError> {
        let removed = self.store.delete_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed = removed, "Expired sessions cleaned up");
        }
        Ok(removed)
    }

    /// Runs a cleanup cycle every `interval` until `shutdown` flips to true.
    pub async fn run_periodic(
        self,
        interval: std::time::Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, "Session cleanup failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Session cleanup stopped");
                        break;
                    }
                }
            }
        }
    }
}
