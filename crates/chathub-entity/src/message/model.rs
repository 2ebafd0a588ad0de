//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chathub_core::types::id::{MessageId, RoomId, UserId};

use crate::user::UserProfile;

/// A persisted chat message, as returned by the store with the sender
/// profile joined.
///
/// Content is immutable after creation; only `pinned` and `read_by` may
/// change later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// The room this message belongs to.
    pub room_id: RoomId,
    /// Sender profile, joined for rendering.
    pub sender: UserProfile,
    /// Message text. May be empty when an attachment is present.
    pub content: String,
    /// Detected emotion annotation, if the client supplied one.
    pub emotion: Option<String>,
    /// Avatar expression annotation, if the client supplied one.
    pub avatar_expression: Option<String>,
    /// URL of an uploaded attachment, if any.
    pub attachment_url: Option<String>,
    /// Parent message for threaded replies.
    pub parent_id: Option<MessageId>,
    /// Whether the message is pinned in its room.
    pub pinned: bool,
    /// Users who have read this message.
    pub read_by: Vec<UserId>,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to persist a new message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    /// Target room.
    pub room_id: RoomId,
    /// Sending user.
    pub sender_id: UserId,
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

impl CreateMessage {
    /// A plain text message with no annotations.
    pub fn text(room_id: RoomId, sender_id: UserId, content: impl Into<String>) -> Self {
        Self {
            room_id,
            sender_id,
            content: content.into(),
            emotion: None,
            avatar_expression: None,
            attachment_url: None,
            parent_id: None,
        }
    }

    /// Whether the request carries anything to deliver.
    pub fn has_payload(&self) -> bool {
        !self.content.trim().is_empty() || self.attachment_url.is_some()
    }
}
