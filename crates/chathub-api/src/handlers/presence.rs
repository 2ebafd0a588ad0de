//! Room presence snapshot handler.
//!
//! Mirrors the `online_users` socket event for initial page render, so
//! clients do not have to wait for the first realtime snapshot.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use chathub_core::error::AppError;
use chathub_core::types::id::{RoomId, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Presence snapshot for one room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPresenceResponse {
    /// The room described.
    pub room_id: RoomId,
    /// Every user with at least one connection joined to the room.
    pub users: Vec<UserId>,
}

/// GET /api/rooms/{room_id}/online
pub async fn online_users(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomPresenceResponse>, ApiError> {
    if state.store.find_room(room_id).await?.is_none() {
        return Err(AppError::not_found(format!("Unknown room {room_id}")).into());
    }

    Ok(Json(RoomPresenceResponse {
        room_id,
        users: state.coordinator.online_users(&room_id),
    }))
}
