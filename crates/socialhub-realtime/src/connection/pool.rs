//! Connection pool: tracks all registered connections indexed by user ID.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of registered connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// User ID → connections in registration order (oldest first).
    by_user: DashMap<Uuid, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handle`. If the user then holds more than `max_per_user`
    /// connections, the oldest ones are removed and returned.
    pub fn add(&self, handle: Arc<ConnectionHandle>, max_per_user: usize) -> Vec<Arc<ConnectionHandle>> {
        self.by_id.insert(handle.id, Arc::clone(&handle));

        let evicted: Vec<Arc<ConnectionHandle>> = {
            let mut connections = self.by_user.entry(handle.user_id).or_default();
            connections.push(handle);
            let excess = connections.len().saturating_sub(max_per_user.max(1));
            connections.drain(..excess).collect()
        };

        for conn in &evicted {
            self.by_id.remove(&conn.id);
        }
        evicted
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user.remove_if(&handle.user_id, |_, c| c.is_empty());
            }
        }
        Some(handle)
    }

    /// Gets all connections for a user.
    pub fn user_connections(&self, user_id: &Uuid) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Gets the connections of one device of a user.
    pub fn device_connections(&self, user_id: &Uuid, device_id: &str) -> Vec<Arc<ConnectionHandle>> {
        self.user_connections(user_id)
            .into_iter()
            .filter(|c| c.device_id == device_id)
            .collect()
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Removes and returns every connection.
    pub fn drain(&self) -> Vec<Arc<ConnectionHandle>> {
        let ids: Vec<ConnectionId> = self.by_id.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }
}
