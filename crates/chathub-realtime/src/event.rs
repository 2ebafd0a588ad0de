//! Inbound and outbound realtime event definitions.
//!
//! Event names on the wire follow the existing client protocol
//! (`join-room`, `send-message`, `message_read`, `online_users`, ...),
//! encoded as internally-tagged JSON.

use serde::{Deserialize, Serialize};

use chathub_core::types::id::{MessageId, RoomId, UserId};
use chathub_entity::message::Message;
use chathub_entity::reaction::Reaction;

/// Events sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Join a room; subsequent room broadcasts reach this connection.
    #[serde(rename = "join-room")]
    JoinRoom {
        /// Target room.
        room_id: RoomId,
    },
    /// Leave a room.
    #[serde(rename = "leave-room")]
    LeaveRoom {
        /// Target room.
        room_id: RoomId,
    },
    /// Send a message to a room.
    #[serde(rename = "send-message")]
    SendMessage {
        /// Target room.
        room_id: RoomId,
        /// Message text. May be empty when an attachment is supplied.
        #[serde(default)]
        content: String,
        /// Detected emotion annotation.
        #[serde(default)]
        emotion: Option<String>,
        /// Avatar expression annotation.
        #[serde(default)]
        avatar_expression: Option<String>,
        /// Uploaded attachment URL.
        #[serde(default)]
        attachment_url: Option<String>,
        /// Parent message for threaded replies.
        #[serde(default)]
        parent_id: Option<MessageId>,
    },
    /// React to a message with an emoji.
    #[serde(rename = "add-reaction")]
    AddReaction {
        /// Target message.
        message_id: MessageId,
        /// The emoji.
        emoji: String,
    },
    /// Record that this user has read a message.
    #[serde(rename = "message_read")]
    MessageRead {
        /// Room the message belongs to.
        room_id: RoomId,
        /// The message read.
        message_id: MessageId,
    },
    /// Transient typing indicator.
    #[serde(rename = "typing")]
    Typing {
        /// Room being typed in.
        room_id: RoomId,
        /// Display name to relay.
        user_name: String,
    },
}

/// Events sent by the server to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A message was persisted and is being fanned out to the room.
    #[serde(rename = "new-message")]
    NewMessage {
        /// The persisted message, sender profile joined.
        message: Message,
    },
    /// A reaction was persisted.
    #[serde(rename = "new-reaction")]
    NewReaction {
        /// The persisted reaction.
        reaction: Reaction,
    },
    /// A user read a message.
    #[serde(rename = "message_read")]
    MessageRead {
        /// The message read.
        message_id: MessageId,
        /// Who read it.
        user_id: UserId,
    },
    /// Full presence snapshot for a room.
    ///
    /// Always the whole set, never a delta, so clients cannot drift on a
    /// missed event.
    #[serde(rename = "online_users")]
    OnlineUsers {
        /// The room this snapshot describes.
        room_id: RoomId,
        /// Every user with at least one connection joined to the room.
        users: Vec<UserId>,
    },
    /// Relayed typing indicator.
    #[serde(rename = "typing")]
    Typing {
        /// Display name of the typist.
        user_name: String,
    },
    /// Targeted notification that this user was mentioned.
    #[serde(rename = "mention-notification")]
    MentionNotification {
        /// Username of the mentioning sender.
        by: String,
        /// The message containing the mention.
        message: Message,
    },
    /// An inbound event failed; delivered only to the originating connection.
    #[serde(rename = "message-error")]
    MessageError {
        /// Machine-readable error code.
        code: String,
        /// Human-readable description.
        error: String,
    },
}
