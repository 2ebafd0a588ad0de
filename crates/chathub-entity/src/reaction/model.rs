//! Reaction entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chathub_core::types::id::{MessageId, ReactionId, UserId};

use crate::user::UserProfile;

/// An emoji reaction attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    /// Unique reaction identifier.
    pub id: ReactionId,
    /// The message this reaction belongs to.
    pub message_id: MessageId,
    /// Reacting user profile, joined for rendering.
    pub user: UserProfile,
    /// The emoji.
    pub emoji: String,
    /// When the reaction was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to persist a new reaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReaction {
    /// Target message.
    pub message_id: MessageId,
    /// Reacting user.
    pub user_id: UserId,
    /// The emoji.
    pub emoji: String,
}
