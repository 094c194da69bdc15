//! WebSocket connection registry.

pub mod authenticator;
pub mod handle;
pub mod manager;
pub mod pool;

pub use authenticator::{AuthenticatedConnection, WsAuthenticator};
pub use handle::{ConnectionHandle, ConnectionId, PushError};
pub use manager::ConnectionManager;
pub use pool::ConnectionPool;
