//! The store contract consumed by the realtime engine.

use async_trait::async_trait;

use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, RoomId, UserId};
use chathub_entity::message::{CreateMessage, Message};
use chathub_entity::notification::RoomNotificationPreference;
use chathub_entity::reaction::{CreateReaction, Reaction};
use chathub_entity::room::{Room, RoomMember};

/// Persistence operations the realtime engine depends on.
///
/// The engine has append/associate access only: it creates messages and
/// reactions and records read receipts, but never rewrites content.
/// Everything else about the relational schema belongs to the CRUD layer.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new message and return it with the sender profile joined.
    async fn create_message(&self, input: CreateMessage) -> AppResult<Message>;

    /// Persist a new reaction and return it with the user profile joined.
    async fn create_reaction(&self, input: CreateReaction) -> AppResult<Reaction>;

    /// Look up a message by id (used to find the room owning a reaction).
    async fn find_message(&self, id: MessageId) -> AppResult<Option<Message>>;

    /// Look up a room by id.
    async fn find_room(&self, id: RoomId) -> AppResult<Option<Room>>;

    /// Fetch the persisted membership of a room.
    async fn room_members(&self, id: RoomId) -> AppResult<Vec<RoomMember>>;

    /// Read a user's notification preference for a room.
    ///
    /// Absence of a stored row means [`RoomNotificationPreference::All`].
    async fn notification_preference(
        &self,
        user_id: UserId,
        room_id: RoomId,
    ) -> AppResult<RoomNotificationPreference>;

    /// Record that a user has read a message. Idempotent.
    async fn mark_read(&self, message_id: MessageId, user_id: UserId) -> AppResult<()>;
}
