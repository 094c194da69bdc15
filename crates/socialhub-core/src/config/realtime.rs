//! Real-time gateway configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) gateway and notification queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum live connections per user; the oldest is closed beyond it.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Outbound buffer size of each connection.
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer_size: usize,
    /// Capacity of the notification queue between producers and the dispatcher.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum undelivered notifications held per offline user.
    #[serde(default = "default_max_pending")]
    pub max_pending_per_user: usize,
    /// How long an undelivered notification is held before being dropped.
    #[serde(default = "default_pending_retention")]
    pub pending_retention_seconds: u64,
    /// Interval between sweeps of expired held notifications.
    #[serde(default = "default_prune_interval")]
    pub prune_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_connections_per_user: default_max_connections_per_user(),
            connection_buffer_size: default_connection_buffer(),
            queue_capacity: default_queue_capacity(),
            max_pending_per_user: default_max_pending(),
            pending_retention_seconds: default_pending_retention(),
            prune_interval_seconds: default_prune_interval(),
        }
    }
}

fn default_max_connections_per_user() -> usize {
    10
}

fn default_connection_buffer() -> usize {
    64
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_pending() -> usize {
    100
}

fn default_pending_retention() -> u64 {
    300
}

fn default_prune_interval() -> u64 {
    60
}
