//! PostgreSQL implementation of the [`Store`] contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_core::types::id::{MessageId, ReactionId, RoomId, UserId};
use chathub_entity::message::{CreateMessage, Message};
use chathub_entity::notification::RoomNotificationPreference;
use chathub_entity::reaction::{CreateReaction, Reaction};
use chathub_entity::room::{Room, RoomMember};
use chathub_entity::user::UserProfile;

use crate::store::Store;

/// Store implementation backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Flat row shape for messages with the sender profile joined.
#[derive(Debug, FromRow)]
struct MessageRow {
    id: MessageId,
    room_id: RoomId,
    sender_id: UserId,
    sender_username: String,
    sender_avatar_url: Option<String>,
    content: String,
    emotion: Option<String>,
    avatar_expression: Option<String>,
    attachment_url: Option<String>,
    parent_id: Option<MessageId>,
    pinned: bool,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self, read_by: Vec<UserId>) -> Message {
        Message {
            id: self.id,
            room_id: self.room_id,
            sender: UserProfile {
                id: self.sender_id,
                username: self.sender_username,
                avatar_url: self.sender_avatar_url,
            },
            content: self.content,
            emotion: self.emotion,
            avatar_expression: self.avatar_expression,
            attachment_url: self.attachment_url,
            parent_id: self.parent_id,
            pinned: self.pinned,
            read_by,
            created_at: self.created_at,
        }
    }
}

/// Flat row shape for reactions with the user profile joined.
#[derive(Debug, FromRow)]
struct ReactionRow {
    id: ReactionId,
    message_id: MessageId,
    user_id: UserId,
    username: String,
    avatar_url: Option<String>,
    emoji: String,
    created_at: DateTime<Utc>,
}

impl From<ReactionRow> for Reaction {
    fn from(row: ReactionRow) -> Self {
        Reaction {
            id: row.id,
            message_id: row.message_id,
            user: UserProfile {
                id: row.user_id,
                username: row.username,
                avatar_url: row.avatar_url,
            },
            emoji: row.emoji,
            created_at: row.created_at,
        }
    }
}

const MESSAGE_SELECT: &str = "SELECT m.id, m.room_id, m.sender_id, \
     u.username AS sender_username, u.avatar_url AS sender_avatar_url, \
     m.content, m.emotion, m.avatar_expression, m.attachment_url, \
     m.parent_id, m.pinned, m.created_at \
     FROM messages m JOIN users u ON u.id = m.sender_id";

impl PgStore {
    /// Create a new PostgreSQL store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_message_row(&self, id: MessageId) -> AppResult<Option<MessageRow>> {
        sqlx::query_as::<_, MessageRow>(&format!("{MESSAGE_SELECT} WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch message", e))
    }

    async fn fetch_read_by(&self, id: MessageId) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM message_reads WHERE message_id = $1 ORDER BY read_at",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch read receipts", e))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_message(&self, input: CreateMessage) -> AppResult<Message> {
        let id = MessageId::new();

        sqlx::query(
            "INSERT INTO messages \
             (id, room_id, sender_id, content, emotion, avatar_expression, attachment_url, parent_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(input.room_id)
        .bind(input.sender_id)
        .bind(&input.content)
        .bind(&input.emotion)
        .bind(&input.avatar_expression)
        .bind(&input.attachment_url)
        .bind(input.parent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert message", e))?;

        self.fetch_message_row(id)
            .await?
            .map(|row| row.into_message(Vec::new()))
            .ok_or_else(|| AppError::database("Inserted message not found"))
    }

    async fn create_reaction(&self, input: CreateReaction) -> AppResult<Reaction> {
        let id = ReactionId::new();

        sqlx::query("INSERT INTO reactions (id, message_id, user_id, emoji) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(input.message_id)
            .bind(input.user_id)
            .bind(&input.emoji)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert reaction", e)
            })?;

        sqlx::query_as::<_, ReactionRow>(
            "SELECT r.id, r.message_id, r.user_id, u.username, u.avatar_url, r.emoji, r.created_at \
             FROM reactions r JOIN users u ON u.id = r.user_id WHERE r.id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map(Reaction::from)
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch reaction", e))
    }

    async fn find_message(&self, id: MessageId) -> AppResult<Option<Message>> {
        match self.fetch_message_row(id).await? {
            Some(row) => {
                let read_by = self.fetch_read_by(id).await?;
                Ok(Some(row.into_message(read_by)))
            }
            None => Ok(None),
        }
    }

    async fn find_room(&self, id: RoomId) -> AppResult<Option<Room>> {
        sqlx::query_as::<_, Room>("SELECT id, name, created_at FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch room", e))
    }

    async fn room_members(&self, id: RoomId) -> AppResult<Vec<RoomMember>> {
        sqlx::query_as::<_, RoomMember>(
            "SELECT u.id AS user_id, u.username, u.email, u.notifications_enabled \
             FROM room_members rm JOIN users u ON u.id = rm.user_id \
             WHERE rm.room_id = $1 ORDER BY u.username",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch room members", e))
    }

    async fn notification_preference(
        &self,
        user_id: UserId,
        room_id: RoomId,
    ) -> AppResult<RoomNotificationPreference> {
        let stored: Option<String> = sqlx::query_scalar(
            "SELECT preference FROM notification_preferences WHERE user_id = $1 AND room_id = $2",
        )
        .bind(user_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch preference", e))?;

        match stored {
            Some(value) => value
                .parse()
                .map_err(|e: String| AppError::new(ErrorKind::Database, e)),
            None => Ok(RoomNotificationPreference::All),
        }
    }

    async fn mark_read(&self, message_id: MessageId, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO message_reads (message_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(message_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record read receipt", e))?;

        Ok(())
    }
}
