//! WebSocket frames and their JSON encoding.

pub mod handler;
pub mod serializer;
pub mod types;

pub use handler::InboundHandler;
pub use types::{InboundMessage, OutboundMessage};
