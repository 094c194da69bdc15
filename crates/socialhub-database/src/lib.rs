//! # socialhub-database
//!
//! Persistence for SocialHub. Repository traits describe the store
//! contracts; `Pg*` types implement them on PostgreSQL and the `memory`
//! module implements them with process-local maps.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

use std::sync::Arc;

use tracing::info;

use socialhub_core::config::{DatabaseConfig, DatabaseProvider};
use socialhub_core::error::AppError;

pub use connection::DatabasePool;
pub use repositories::{NotificationRepository, SessionRepository};

/// The set of repositories the services are built on.
#[derive(Clone)]
pub struct Repositories {
    /// Device session rows.
    pub sessions: Arc<dyn SessionRepository>,
    /// Notification rows.
    pub notifications: Arc<dyn NotificationRepository>,
    /// Underlying pool when the PostgreSQL provider is active.
    pub pool: Option<DatabasePool>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Repositories {
    /// Builds the repositories for the configured provider, connecting and
    /// migrating the database when PostgreSQL is selected.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, AppError> {
        match config.provider {
            DatabaseProvider::Postgres => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    migration::run_migrations(pool.pool()).await?;
                }
                Ok(Self {
                    sessions: Arc::new(repositories::PgSessionRepository::new(
                        pool.pool().clone(),
                    )),
                    notifications: Arc::new(repositories::PgNotificationRepository::new(
                        pool.pool().clone(),
                    )),
                    pool: Some(pool),
                })
            }
            DatabaseProvider::Memory => {
                info!("Using in-memory repositories; data will not survive a restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Repositories backed by process-local maps.
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(memory::MemorySessionRepository::new()),
            notifications: Arc::new(memory::MemoryNotificationRepository::new()),
            pool: None,
        }
    }
}
