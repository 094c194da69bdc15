//! Notification queue, offline buffering and dispatch.

pub mod dispatcher;
pub mod pending;
pub mod queue;

pub use dispatcher::{DispatchCommand, NotificationDispatcher};
pub use pending::{HeldNotification, PendingBuffer};
pub use queue::NotificationQueue;
