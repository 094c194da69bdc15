//! # socialhub-realtime
//!
//! Real-time delivery for SocialHub:
//!
//! - WebSocket connection registry with per-user connection caps
//! - Bounded notification queue drained by a single dispatcher
//! - Per-user pending buffer for recipients that are offline
//! - axum WebSocket endpoint authenticated by access token

pub mod connection;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod server;
pub mod ws;

pub use connection::manager::ConnectionManager;
pub use message::handler::InboundHandler;
pub use notification::dispatcher::NotificationDispatcher;
pub use notification::queue::NotificationQueue;
pub use server::RealtimeEngine;
