//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chathub_core::types::id::UserId;

/// A registered user of the chat system.
///
/// Usernames are unique handles; mention resolution matches on them
/// exactly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login handle.
    pub username: String,
    /// Email address (optional; users without one never receive email).
    pub email: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Account-wide notification switch. When false, no email is ever
    /// sent to this user regardless of per-room preferences.
    pub notifications_enabled: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The lightweight profile embedded in broadcast payloads.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// The sender profile joined onto messages and reactions before fan-out,
/// so clients can render without an extra lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Username handle.
    pub username: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}
