//! # socialhub-service
//!
//! Application services for SocialHub. Each service orchestrates
//! repositories and the realtime engine to implement a use case.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time.

pub mod notification;

pub use notification::NotificationService;
