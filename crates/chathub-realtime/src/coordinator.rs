//! Coordinator — wires the realtime subsystems around the connection
//! lifecycle: `connect → (join/leave)* → disconnect`.
//!
//! Constructed once per process and shared by `Arc`; all presence state
//! lives inside it, never in globals. Presence is process-local: scaling
//! out to multiple instances requires an external presence backplane.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use chathub_core::config::notify::NotifyConfig;
use chathub_core::config::realtime::RealtimeConfig;
use chathub_core::error::AppError;
use chathub_core::types::id::{RoomId, UserId};
use chathub_notify::EmailQueue;
use chathub_store::Store;

use crate::broadcast::{MessageBroadcaster, SendRequest};
use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::registry::ConnectionRegistry;
use crate::event::{ClientEvent, ServerEvent};
use crate::mention::MentionResolver;
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::offline::OfflineNotifier;
use crate::rooms::RoomIndex;

/// Central coordinator owning all realtime state.
pub struct Coordinator {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomIndex>,
    broadcaster: MessageBroadcaster,
    metrics: Arc<RealtimeMetrics>,
    channel_buffer_size: usize,
    reconcile_interval: Duration,
}

impl Coordinator {
    /// Wire up a coordinator against a store and an email queue.
    pub fn new(
        realtime: &RealtimeConfig,
        notify: &NotifyConfig,
        store: Arc<dyn Store>,
        emails: EmailQueue,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let rooms = Arc::new(RoomIndex::new());
        let metrics = Arc::new(RealtimeMetrics::new());
        let store_timeout = Duration::from_secs(realtime.store_timeout_seconds);

        let mentions = Arc::new(MentionResolver::new(
            registry.clone(),
            store.clone(),
            emails.clone(),
            metrics.clone(),
            store_timeout,
        ));
        let offline = Arc::new(OfflineNotifier::new(
            registry.clone(),
            store.clone(),
            emails,
            metrics.clone(),
            notify.coalesce_overlap,
            store_timeout,
        ));
        let broadcaster = MessageBroadcaster::new(
            registry.clone(),
            rooms.clone(),
            store,
            mentions,
            offline,
            metrics.clone(),
            store_timeout,
        );

        info!("Realtime coordinator initialized");

        Self {
            registry,
            rooms,
            broadcaster,
            metrics,
            channel_buffer_size: realtime.channel_buffer_size,
            reconcile_interval: Duration::from_secs(realtime.reconcile_interval_seconds),
        }
    }

    /// Register a new connection for an authenticated identity.
    ///
    /// Returns the handle and the receiver the transport layer forwards
    /// to the client.
    pub fn connect(
        &self,
        user_id: UserId,
        username: String,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id, username, tx));

        self.registry.register(handle.clone());
        self.metrics.connection_opened();

        info!(
            conn_id = %handle.id,
            user_id = %handle.user_id,
            "Connection registered"
        );

        (handle, rx)
    }

    /// Tear down a connection: drop it from every room, unregister it, and
    /// re-broadcast presence for the rooms it was in.
    ///
    /// Safe to call repeatedly; a second disconnect is a no-op with no
    /// further presence broadcasts.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        let removed = self.registry.unregister(conn_id);
        let affected = self.rooms.remove_connection(*conn_id);

        if removed.is_none() && affected.is_empty() {
            return;
        }

        for room_id in &affected {
            self.broadcast_presence(room_id);
        }

        if let Some(handle) = removed {
            info!(
                conn_id = %conn_id,
                user_id = %handle.user_id,
                "Connection unregistered"
            );
        }
    }

    /// Process one inbound event from a connection.
    ///
    /// The transport layer calls this sequentially per connection, which
    /// gives each connection strict receipt-order handling.
    pub async fn handle_event(&self, conn_id: &ConnectionId, event: ClientEvent) {
        let Some(handle) = self.registry.get(conn_id) else {
            warn!(conn_id = %conn_id, "Event from unknown connection");
            return;
        };

        match event {
            ClientEvent::JoinRoom { room_id } => {
                self.rooms.join(room_id, handle.id);
                self.broadcast_presence(&room_id);
                debug!(conn_id = %handle.id, room_id = %room_id, "Joined room");
            }
            ClientEvent::LeaveRoom { room_id } => {
                self.rooms.leave(room_id, handle.id);
                self.broadcast_presence(&room_id);
                debug!(conn_id = %handle.id, room_id = %room_id, "Left room");
            }
            ClientEvent::SendMessage {
                room_id,
                content,
                emotion,
                avatar_expression,
                attachment_url,
                parent_id,
            } => {
                let request = SendRequest {
                    room_id,
                    content,
                    emotion,
                    avatar_expression,
                    attachment_url,
                    parent_id,
                };
                if let Err(e) = self.broadcaster.handle_send(&handle, request).await {
                    warn!(conn_id = %handle.id, room_id = %room_id, error = %e, "Send failed");
                    handle.send(error_event(&e));
                }
            }
            ClientEvent::AddReaction { message_id, emoji } => {
                if let Err(e) = self
                    .broadcaster
                    .handle_reaction(&handle, message_id, emoji)
                    .await
                {
                    warn!(conn_id = %handle.id, message_id = %message_id, error = %e, "Reaction failed");
                    handle.send(error_event(&e));
                }
            }
            ClientEvent::MessageRead {
                room_id,
                message_id,
            } => {
                if let Err(e) = self
                    .broadcaster
                    .handle_read_receipt(&handle, room_id, message_id)
                    .await
                {
                    warn!(conn_id = %handle.id, message_id = %message_id, error = %e, "Read receipt failed");
                }
            }
            ClientEvent::Typing { room_id, user_name } => {
                // Stateless relay; the client expires the indicator itself.
                self.broadcaster.broadcast_to_room_except(
                    &room_id,
                    &ServerEvent::Typing { user_name },
                    handle.id,
                );
            }
        }
    }

    /// Broadcast the full presence snapshot of a room to the room.
    fn broadcast_presence(&self, room_id: &RoomId) {
        let users = self.rooms.online_users(room_id, &self.registry);
        self.broadcaster.broadcast_to_room(
            room_id,
            &ServerEvent::OnlineUsers {
                room_id: *room_id,
                users,
            },
        );
    }

    /// Periodic presence reconciliation: drop index entries whose
    /// connection no longer exists and re-broadcast repaired rooms.
    ///
    /// Runs until the cancel signal fires.
    pub async fn run_reconciler(self: Arc<Self>, mut cancel: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.reconcile_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        debug!("Presence reconciler received shutdown signal");
                        break;
                    }
                }
                _ = interval.tick() => {
                    let repaired = self.rooms.reconcile(&self.registry);
                    if !repaired.is_empty() {
                        warn!(
                            rooms = repaired.len(),
                            "Presence inconsistency repaired: stale connections dropped"
                        );
                        self.metrics.presence_repaired(repaired.len() as u64);
                        for room_id in &repaired {
                            self.broadcast_presence(room_id);
                        }
                    }
                }
            }
        }
    }

    /// The online users of a room right now.
    pub fn online_users(&self, room_id: &RoomId) -> Vec<UserId> {
        self.rooms.online_users(room_id, &self.registry)
    }

    /// Whether a user has at least one live connection.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.registry.is_online(user_id)
    }

    /// Total live connections.
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Distinct connected users.
    pub fn user_count(&self) -> usize {
        self.registry.user_count()
    }

    /// Rooms with at least one joined connection.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// Snapshot of the engine counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn error_event(error: &AppError) -> ServerEvent {
    ServerEvent::MessageError {
        code: error.kind.to_string(),
        error: error.message.clone(),
    }
}
