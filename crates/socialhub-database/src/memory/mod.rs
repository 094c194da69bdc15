//! In-process repository implementations.
//!
//! Selected with `database.provider = "memory"` and used by the test
//! suites. Each repository guards its map with a single async lock so
//! every operation is atomic with respect to the others.

pub mod notification;
pub mod session;

pub use notification::MemoryNotificationRepository;
pub use session::MemorySessionRepository;
