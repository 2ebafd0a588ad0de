//! Room membership entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chathub_core::types::id::UserId;

/// A persisted room member, carrying the user fields the notification
/// pipelines decide on.
///
/// Distinct from *presence*: membership says who belongs to the room,
/// presence says who is connected right now.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoomMember {
    /// Member user identifier.
    pub user_id: UserId,
    /// Username handle (mention resolution matches on this).
    pub username: String,
    /// Email address, if the user has one on file.
    pub email: Option<String>,
    /// Account-wide notification switch.
    pub notifications_enabled: bool,
}
