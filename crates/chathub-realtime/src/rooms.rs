//! Room membership index — which connections have joined which rooms.
//!
//! The index stores *connection ids*, not user ids. The per-room online
//! user set is always derived through the connection registry, which makes
//! the multi-tab rule structural: a user stays present in a room exactly
//! as long as at least one of their live connections has it joined.

use std::collections::HashSet;

use dashmap::DashMap;

use chathub_core::types::id::{RoomId, UserId};

use crate::connection::handle::ConnectionId;
use crate::connection::registry::ConnectionRegistry;

/// In-memory index of joined rooms per connection.
///
/// Ephemeral and rebuilt from zero at process start; clients re-join on
/// reconnect.
#[derive(Debug, Default)]
pub struct RoomIndex {
    /// Room → set of joined connection ids.
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
    /// Connection → set of joined rooms (reverse index).
    joined: DashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection joining a room.
    ///
    /// Returns whether the connection was newly added (a repeated join of
    /// the same room is a no-op).
    pub fn join(&self, room_id: RoomId, conn_id: ConnectionId) -> bool {
        let added = self.rooms.entry(room_id).or_default().insert(conn_id);
        self.joined.entry(conn_id).or_default().insert(room_id);
        added
    }

    /// Records a connection leaving a room.
    ///
    /// Returns whether the connection had the room joined.
    pub fn leave(&self, room_id: RoomId, conn_id: ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(&room_id) {
            Some(mut conns) => {
                let removed = conns.remove(&conn_id);
                if conns.is_empty() {
                    drop(conns);
                    self.rooms.remove(&room_id);
                }
                removed
            }
            None => false,
        };

        if let Some(mut rooms) = self.joined.get_mut(&conn_id) {
            rooms.remove(&room_id);
            if rooms.is_empty() {
                drop(rooms);
                self.joined.remove(&conn_id);
            }
        }

        removed
    }

    /// Removes a connection from every room it had joined.
    ///
    /// Returns the affected rooms so presence can be re-broadcast.
    pub fn remove_connection(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        let rooms = self
            .joined
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default();

        for room_id in &rooms {
            if let Some(mut conns) = self.rooms.get_mut(room_id) {
                conns.remove(&conn_id);
                if conns.is_empty() {
                    drop(conns);
                    self.rooms.remove(room_id);
                }
            }
        }

        rooms.into_iter().collect()
    }

    /// All connection ids currently joined to a room.
    pub fn connections_in(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|conns| conns.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a connection has a room joined.
    pub fn is_joined(&self, room_id: &RoomId, conn_id: &ConnectionId) -> bool {
        self.rooms
            .get(room_id)
            .map(|conns| conns.contains(conn_id))
            .unwrap_or(false)
    }

    /// The distinct online users of a room, derived through the registry.
    pub fn online_users(&self, room_id: &RoomId, registry: &ConnectionRegistry) -> Vec<UserId> {
        let mut seen = HashSet::new();
        let mut users = Vec::new();
        for conn_id in self.connections_in(room_id) {
            if let Some(handle) = registry.get(&conn_id) {
                if seen.insert(handle.user_id) {
                    users.push(handle.user_id);
                }
            }
        }
        users
    }

    /// Number of rooms with at least one joined connection.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drops index entries whose connection is no longer registered.
    ///
    /// Such entries can only appear if disconnect cleanup was skipped (a
    /// panic between unregister and index removal). Returns the rooms that
    /// were repaired so presence can be re-broadcast.
    pub fn reconcile(&self, registry: &ConnectionRegistry) -> Vec<RoomId> {
        let room_ids: Vec<RoomId> = self.rooms.iter().map(|entry| *entry.key()).collect();
        let mut repaired = Vec::new();

        for room_id in room_ids {
            let stale: Vec<ConnectionId> = self
                .connections_in(&room_id)
                .into_iter()
                .filter(|conn_id| !registry.contains(conn_id))
                .collect();

            if !stale.is_empty() {
                for conn_id in stale {
                    self.leave(room_id, conn_id);
                }
                repaired.push(room_id);
            }
        }

        repaired
    }
}
