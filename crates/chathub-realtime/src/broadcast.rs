//! Message broadcaster — persist-then-fan-out.
//!
//! The primary send path is: validate, persist via the store, broadcast
//! the persisted record to every connection joined to the room. The
//! notification pipelines (mentions, offline email) run afterwards on a
//! spawned task and can never fail or delay a send.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, RoomId};
use chathub_entity::message::{CreateMessage, Message};
use chathub_entity::reaction::{CreateReaction, Reaction};
use chathub_store::Store;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::registry::ConnectionRegistry;
use crate::event::ServerEvent;
use crate::mention::MentionResolver;
use crate::metrics::RealtimeMetrics;
use crate::offline::OfflineNotifier;
use crate::rooms::RoomIndex;

/// Fields of an inbound send request.
#[derive(Debug, Clone)]
pub struct SendRequest {
    /// Target room.
    pub room_id: RoomId,
    /// Message text.
    pub content: String,
    /// Emotion annotation.
    pub emotion: Option<String>,
    /// Avatar expression annotation.
    pub avatar_expression: Option<String>,
    /// Uploaded attachment URL.
    pub attachment_url: Option<String>,
    /// Parent message for replies.
    pub parent_id: Option<MessageId>,
}

/// Persists inbound events and fans the results out to rooms.
pub struct MessageBroadcaster {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomIndex>,
    store: Arc<dyn Store>,
    mentions: Arc<MentionResolver>,
    offline: Arc<OfflineNotifier>,
    metrics: Arc<RealtimeMetrics>,
    store_timeout: Duration,
}

impl MessageBroadcaster {
    /// Create a new broadcaster.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        rooms: Arc<RoomIndex>,
        store: Arc<dyn Store>,
        mentions: Arc<MentionResolver>,
        offline: Arc<OfflineNotifier>,
        metrics: Arc<RealtimeMetrics>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            rooms,
            store,
            mentions,
            offline,
            metrics,
            store_timeout,
        }
    }

    /// Deliver an event to every connection joined to a room.
    ///
    /// Returns the number of connections the event was accepted by.
    pub fn broadcast_to_room(&self, room_id: &RoomId, event: &ServerEvent) -> usize {
        self.broadcast_filtered(room_id, event, None)
    }

    /// Deliver an event to a room, excluding one connection (typing relays
    /// never echo back to the typist).
    pub fn broadcast_to_room_except(
        &self,
        room_id: &RoomId,
        event: &ServerEvent,
        except: ConnectionId,
    ) -> usize {
        self.broadcast_filtered(room_id, event, Some(except))
    }

    fn broadcast_filtered(
        &self,
        room_id: &RoomId,
        event: &ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        let mut sent = 0;
        for conn_id in self.rooms.connections_in(room_id) {
            if Some(conn_id) == except {
                continue;
            }
            if let Some(handle) = self.registry.get(&conn_id) {
                if handle.send(event.clone()) {
                    sent += 1;
                }
            }
        }
        self.metrics.events_delivered_count(sent as u64);
        sent
    }

    /// Handle an inbound send: validate, persist, fan out, then kick off
    /// the notification pipelines.
    ///
    /// The broadcast always targets the whole room, including the sender's
    /// own other connections; clients dedup by message id against their
    /// optimistic echo.
    pub async fn handle_send(
        &self,
        sender: &Arc<ConnectionHandle>,
        request: SendRequest,
    ) -> AppResult<Message> {
        if !self.registry.contains(&sender.id) {
            return Err(AppError::validation("Sender is not connected"));
        }

        let input = CreateMessage {
            room_id: request.room_id,
            sender_id: sender.user_id,
            content: request.content,
            emotion: request.emotion,
            avatar_expression: request.avatar_expression,
            attachment_url: request.attachment_url,
            parent_id: request.parent_id,
        };
        if !input.has_payload() {
            return Err(AppError::validation(
                "Message needs content or an attachment",
            ));
        }

        let message = self
            .with_store_timeout("create message", self.store.create_message(input))
            .await?;

        self.broadcast_to_room(
            &message.room_id,
            &ServerEvent::NewMessage {
                message: message.clone(),
            },
        );
        self.metrics.message_broadcast();

        self.spawn_notifications(message.clone());

        Ok(message)
    }

    /// Handle an inbound reaction: persist, locate the owning room, fan out.
    pub async fn handle_reaction(
        &self,
        sender: &Arc<ConnectionHandle>,
        message_id: MessageId,
        emoji: String,
    ) -> AppResult<Reaction> {
        if !self.registry.contains(&sender.id) {
            return Err(AppError::validation("Sender is not connected"));
        }

        let reaction = self
            .with_store_timeout(
                "create reaction",
                self.store.create_reaction(CreateReaction {
                    message_id,
                    user_id: sender.user_id,
                    emoji,
                }),
            )
            .await?;

        match self
            .with_store_timeout("find message", self.store.find_message(message_id))
            .await
        {
            Ok(Some(message)) => {
                self.broadcast_to_room(
                    &message.room_id,
                    &ServerEvent::NewReaction {
                        reaction: reaction.clone(),
                    },
                );
            }
            Ok(None) => {
                warn!(message_id = %message_id, "Reacted message vanished, broadcast skipped");
            }
            Err(e) => {
                warn!(message_id = %message_id, error = %e, "Room lookup failed, reaction broadcast skipped");
            }
        }

        Ok(reaction)
    }

    /// Handle an inbound read receipt: persist the association, fan out.
    pub async fn handle_read_receipt(
        &self,
        sender: &Arc<ConnectionHandle>,
        room_id: RoomId,
        message_id: MessageId,
    ) -> AppResult<()> {
        self.with_store_timeout("mark read", self.store.mark_read(message_id, sender.user_id))
            .await?;

        self.broadcast_to_room(
            &room_id,
            &ServerEvent::MessageRead {
                message_id,
                user_id: sender.user_id,
            },
        );

        Ok(())
    }

    /// Kick off the fire-and-forget notification pipelines for a persisted
    /// message. Failures in here are logged, never surfaced to the sender.
    fn spawn_notifications(&self, message: Message) {
        let store = self.store.clone();
        let mentions = self.mentions.clone();
        let offline = self.offline.clone();
        let store_timeout = self.store_timeout;

        tokio::spawn(async move {
            let members = match tokio::time::timeout(
                store_timeout,
                store.room_members(message.room_id),
            )
            .await
            {
                Ok(Ok(members)) => members,
                Ok(Err(e)) => {
                    warn!(room_id = %message.room_id, error = %e, "Member fetch failed, notifications skipped");
                    return;
                }
                Err(_) => {
                    warn!(room_id = %message.room_id, "Member fetch timed out, notifications skipped");
                    return;
                }
            };
            if members.is_empty() {
                return;
            }

            let room_name =
                match tokio::time::timeout(store_timeout, store.find_room(message.room_id)).await {
                    Ok(Ok(Some(room))) => room.name,
                    Ok(Ok(None)) => message.room_id.to_string(),
                    Ok(Err(e)) => {
                        warn!(room_id = %message.room_id, error = %e, "Room lookup failed, using id in emails");
                        message.room_id.to_string()
                    }
                    Err(_) => {
                        warn!(room_id = %message.room_id, "Room lookup timed out, using id in emails");
                        message.room_id.to_string()
                    }
                };

            let emailed = mentions.resolve(&message, &members, &room_name).await;
            offline
                .notify_room(&message, &members, &room_name, &emailed)
                .await;
        });
    }

    async fn with_store_timeout<T>(
        &self,
        what: &str,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout(format!("Store call timed out: {what}"))),
        }
    }
}
