//! Repository contracts and their PostgreSQL implementations.

pub mod notification;
pub mod session;

pub use notification::{NotificationRepository, PgNotificationRepository};
pub use session::{PgSessionRepository, SessionRepository};
