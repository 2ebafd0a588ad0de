//! Individual realtime connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use chathub_core::types::id::UserId;

use crate::event::ServerEvent;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single live connection.
///
/// Holds the sender channel for pushing events to the client, plus the
/// authenticated identity presented at connect time. Which rooms the
/// connection has joined lives in the room index, not here, so there is
/// exactly one place that answers membership questions.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// Username (cached for display and typing relays)
    pub username: String,
    /// Sender for outbound events
    sender: mpsc::Sender<ServerEvent>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(user_id: UserId, username: String, sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            username,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Push an event to this connection.
    ///
    /// Never blocks: a full buffer drops the event with a warning, a
    /// closed channel marks the connection dead. Returns whether the
    /// event was accepted.
    pub fn send(&self, event: ServerEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Connection send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_after_receiver_dropped_marks_dead() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(UserId::new(), "alice".to_string(), tx);
        drop(rx);

        assert!(!handle.send(ServerEvent::Typing {
            user_name: "alice".to_string()
        }));
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_full_buffer_drops_event() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(UserId::new(), "alice".to_string(), tx);

        assert!(handle.send(ServerEvent::Typing {
            user_name: "alice".to_string()
        }));
        assert!(!handle.send(ServerEvent::Typing {
            user_name: "alice".to_string()
        }));
        // Still alive; only the overflowing event was lost.
        assert!(handle.is_alive());
        assert!(rx.recv().await.is_some());
    }
}
