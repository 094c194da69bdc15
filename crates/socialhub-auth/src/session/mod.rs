//! Device session lifecycle management.

pub mod cleanup;
pub mod manager;
pub mod store;

pub use cleanup::SessionCleanup;
pub use manager::{AuthTokens, LoginMetadata, SessionManager};
pub use store::SessionStore;
