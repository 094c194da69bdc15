//! Connection manager: handles connection lifecycle and message fan-out.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use socialhub_core::config::RealtimeConfig;

use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Manages all registered connections.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: ConnectionPool,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(config: RealtimeConfig, metrics: Arc<RealtimeMetrics>) -> Self {
        Self {
            pool: ConnectionPool::new(),
            metrics,
            config,
        }
    }

    /// Registers an authenticated connection.
    ///
    /// Returns the connection handle and the receiver of its outbound
    /// buffer. Beyond `max_connections_per_user` the oldest connection of
    /// the user is closed.
    pub fn register(
        &self,
        user_id: Uuid,
        device_id: &str,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(self.config.connection_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(user_id, device_id, tx));

        let evicted = self
            .pool
            .add(Arc::clone(&handle), self.config.max_connections_per_user);
        self.metrics.connection_opened();

        for oldest in evicted {
            warn!(
                user_id = %user_id,
                conn_id = %oldest.id,
                max = self.config.max_connections_per_user,
                "User at max connections, closing oldest"
            );
            oldest.close();
            self.metrics.connection_closed();
        }

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            device_id = %device_id,
            "Connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection. Unknown or already removed ids are ignored.
    pub fn unregister(&self, conn_id: &ConnectionId) -> bool {
        match self.pool.remove(conn_id) {
            Some(handle) => {
                handle.mark_dead();
                self.metrics.connection_closed();
                info!(
                    conn_id = %conn_id,
                    user_id = %handle.user_id,
                    "Connection unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Pushes `msg` to every connection of `user_id`.
    ///
    /// Returns how many connections accepted it. Connections whose push
    /// fails are unregistered; the rest still receive the message.
    pub fn send_to_user(&self, user_id: Uuid, msg: &OutboundMessage) -> usize {
        let mut delivered = 0;
        for conn in self.pool.user_connections(&user_id) {
            match conn.push(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(reason) => {
                    debug!(conn_id = %conn.id, user_id = %user_id, ?reason, "Push failed");
                    self.metrics.push_failed();
                    self.unregister(&conn.id);
                }
            }
        }
        delivered
    }

    /// Whether the user has at least one live connection.
    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.pool
            .user_connections(&user_id)
            .iter()
            .any(|c| c.is_alive())
    }

    /// Connections of `user_id`, oldest first.
    pub fn user_connections(&self, user_id: Uuid) -> Vec<Arc<ConnectionHandle>> {
        self.pool.user_connections(&user_id)
    }

    /// Connections of one device.
    pub fn device_connections(&self, user_id: Uuid, device_id: &str) -> Vec<Arc<ConnectionHandle>> {
        self.pool.device_connections(&user_id, device_id)
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Number of users with at least one registered connection.
    pub fn online_user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Closes and unregisters every connection.
    pub fn close_all(&self) {
        let closed = self.pool.drain();
        for conn in &closed {
            conn.close();
            self.metrics.connection_closed();
        }
        if !closed.is_empty() {
            info!(count = closed.len(), "Closed all connections");
        }
    }
}
