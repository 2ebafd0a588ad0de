//! Connection registry — all live connections indexed by id and by user.

use std::sync::Arc;

use dashmap::DashMap;

use chathub_core::types::id::UserId;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe registry of all live connections.
///
/// One user can hold several connections (tabs, devices). The registry is
/// purely in-memory and lost on restart: every user appears offline until
/// they reconnect.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Connection ID → handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// User ID → handles (one user can have multiple connections).
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection. Idempotent per connection id.
    ///
    /// Returns whether the connection was newly added.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> bool {
        if self.by_id.contains_key(&handle.id) {
            return false;
        }
        self.by_id.insert(handle.id, handle.clone());
        self.by_user.entry(handle.user_id).or_default().push(handle);
        true
    }

    /// Removes a connection.
    ///
    /// Returns the removed handle, or None when the connection was already
    /// gone — repeated unregistration is a no-op.
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        handle.mark_dead();

        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user.remove(&handle.user_id);
            }
        }

        Some(handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Whether a connection id is currently registered.
    pub fn contains(&self, conn_id: &ConnectionId) -> bool {
        self.by_id.contains_key(conn_id)
    }

    /// Gets all connections for a user.
    pub fn connections_for(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// True iff the user has at least one registered connection.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.by_user.contains_key(user_id)
    }

    /// Returns total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of distinct connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}
