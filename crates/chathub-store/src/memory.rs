//! In-memory implementation of the [`Store`] contract.
//!
//! Backed by DashMaps; nothing survives a restart. Used in development
//! mode and throughout the test suites.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, ReactionId, RoomId, UserId};
use chathub_entity::message::{CreateMessage, Message};
use chathub_entity::notification::RoomNotificationPreference;
use chathub_entity::reaction::{CreateReaction, Reaction};
use chathub_entity::room::{Room, RoomMember};
use chathub_entity::user::User;

use crate::store::Store;

/// DashMap-backed store for development and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    rooms: DashMap<RoomId, Room>,
    members: DashMap<RoomId, Vec<UserId>>,
    preferences: DashMap<(UserId, RoomId), RoomNotificationPreference>,
    messages: DashMap<MessageId, Message>,
    reactions: DashMap<ReactionId, Reaction>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user.
    pub fn add_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Insert a room.
    pub fn add_room(&self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    /// Add a user to a room's persisted membership.
    pub fn add_member(&self, room_id: RoomId, user_id: UserId) {
        let mut members = self.members.entry(room_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }

    /// Set a user's notification preference for a room.
    pub fn set_preference(
        &self,
        user_id: UserId,
        room_id: RoomId,
        preference: RoomNotificationPreference,
    ) {
        self.preferences.insert((user_id, room_id), preference);
    }

    /// Number of stored messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_message(&self, input: CreateMessage) -> AppResult<Message> {
        let sender = self
            .users
            .get(&input.sender_id)
            .map(|u| u.profile())
            .ok_or_else(|| AppError::not_found(format!("Unknown sender {}", input.sender_id)))?;

        if !self.rooms.contains_key(&input.room_id) {
            return Err(AppError::not_found(format!(
                "Unknown room {}",
                input.room_id
            )));
        }

        let message = Message {
            id: MessageId::new(),
            room_id: input.room_id,
            sender,
            content: input.content,
            emotion: input.emotion,
            avatar_expression: input.avatar_expression,
            attachment_url: input.attachment_url,
            parent_id: input.parent_id,
            pinned: false,
            read_by: Vec::new(),
            created_at: Utc::now(),
        };

        self.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn create_reaction(&self, input: CreateReaction) -> AppResult<Reaction> {
        let user = self
            .users
            .get(&input.user_id)
            .map(|u| u.profile())
            .ok_or_else(|| AppError::not_found(format!("Unknown user {}", input.user_id)))?;

        if !self.messages.contains_key(&input.message_id) {
            return Err(AppError::not_found(format!(
                "Unknown message {}",
                input.message_id
            )));
        }

        let reaction = Reaction {
            id: ReactionId::new(),
            message_id: input.message_id,
            user,
            emoji: input.emoji,
            created_at: Utc::now(),
        };

        self.reactions.insert(reaction.id, reaction.clone());
        Ok(reaction)
    }

    async fn find_message(&self, id: MessageId) -> AppResult<Option<Message>> {
        Ok(self.messages.get(&id).map(|m| m.clone()))
    }

    async fn find_room(&self, id: RoomId) -> AppResult<Option<Room>> {
        Ok(self.rooms.get(&id).map(|r| r.clone()))
    }

    async fn room_members(&self, id: RoomId) -> AppResult<Vec<RoomMember>> {
        let member_ids = self
            .members
            .get(&id)
            .map(|m| m.clone())
            .unwrap_or_default();

        Ok(member_ids
            .iter()
            .filter_map(|user_id| self.users.get(user_id))
            .map(|user| RoomMember {
                user_id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
                notifications_enabled: user.notifications_enabled,
            })
            .collect())
    }

    async fn notification_preference(
        &self,
        user_id: UserId,
        room_id: RoomId,
    ) -> AppResult<RoomNotificationPreference> {
        Ok(self
            .preferences
            .get(&(user_id, room_id))
            .map(|p| *p)
            .unwrap_or_default())
    }

    async fn mark_read(&self, message_id: MessageId, user_id: UserId) -> AppResult<()> {
        let mut message = self
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| AppError::not_found(format!("Unknown message {message_id}")))?;

        if !message.read_by.contains(&user_id) {
            message.read_by.push(user_id);
        }
        Ok(())
    }
}
