//! Mention parsing and dispatch.
//!
//! Mention tokens are `@` followed by word characters, resolved against the
//! room's persisted membership by exact username. Usernames are unique
//! handles, so a token resolves to at most one member.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use chathub_core::types::id::UserId;
use chathub_entity::message::Message;
use chathub_entity::notification::RoomNotificationPreference;
use chathub_entity::room::RoomMember;
use chathub_notify::{EmailMessage, EmailQueue};
use chathub_store::Store;

use crate::connection::registry::ConnectionRegistry;
use crate::event::ServerEvent;
use crate::metrics::RealtimeMetrics;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Extract distinct mention candidates in first-occurrence order.
///
/// A token only counts when the `@` is not itself preceded by a word
/// character, so email-like text (`a@b`) is not a mention.
pub fn parse_mentions(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '@' && (i == 0 || !is_word_char(chars[i - 1])) {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && is_word_char(chars[end]) {
                end += 1;
            }
            if end > start {
                let name: String = chars[start..end].iter().collect();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            i = end.max(i + 1);
        } else {
            i += 1;
        }
    }

    names
}

/// Resolves mentions in a persisted message and dispatches per-user
/// notifications: in-app for online users, email for offline ones.
pub struct MentionResolver {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn Store>,
    emails: EmailQueue,
    metrics: Arc<RealtimeMetrics>,
    store_timeout: Duration,
}

impl MentionResolver {
    /// Create a new resolver.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn Store>,
        emails: EmailQueue,
        metrics: Arc<RealtimeMetrics>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            emails,
            metrics,
            store_timeout,
        }
    }

    /// Resolve and dispatch all mentions in `message`.
    ///
    /// Runs on the fire-and-forget notification path: every failure is
    /// logged and swallowed. Returns the users a mention email was
    /// enqueued for, so the offline pass can optionally coalesce.
    pub async fn resolve(
        &self,
        message: &Message,
        members: &[RoomMember],
        room_name: &str,
    ) -> HashSet<UserId> {
        let mut emailed = HashSet::new();

        let candidates = parse_mentions(&message.content);
        if candidates.is_empty() {
            return emailed;
        }

        for name in candidates {
            let Some(member) = members.iter().find(|m| m.username == name) else {
                continue;
            };
            if member.user_id == message.sender.id {
                continue;
            }
            if !member.notifications_enabled {
                debug!(user_id = %member.user_id, "Mention skipped, notifications disabled");
                continue;
            }

            let preference = match self.preference_for(member, message).await {
                Some(p) => p,
                None => continue,
            };
            if preference == RoomNotificationPreference::None {
                continue;
            }

            if self.registry.is_online(&member.user_id) {
                let event = ServerEvent::MentionNotification {
                    by: message.sender.username.clone(),
                    message: message.clone(),
                };
                for conn in self.registry.connections_for(&member.user_id) {
                    conn.send(event.clone());
                }
                self.metrics.mention_dispatched();
                debug!(
                    user_id = %member.user_id,
                    message_id = %message.id,
                    "Mention delivered in-app"
                );
            } else {
                let Some(address) = &member.email else {
                    debug!(user_id = %member.user_id, "Mention email skipped, no address on file");
                    continue;
                };
                let email = EmailMessage::mention(
                    address,
                    &message.sender.username,
                    room_name,
                    &message.content,
                );
                if self.emails.enqueue(email) {
                    self.metrics.email_enqueued();
                    emailed.insert(member.user_id);
                }
            }
        }

        emailed
    }

    async fn preference_for(
        &self,
        member: &RoomMember,
        message: &Message,
    ) -> Option<RoomNotificationPreference> {
        let lookup = self
            .store
            .notification_preference(member.user_id, message.room_id);

        match tokio::time::timeout(self.store_timeout, lookup).await {
            Ok(Ok(preference)) => Some(preference),
            Ok(Err(e)) => {
                warn!(user_id = %member.user_id, error = %e, "Preference lookup failed, mention skipped");
                None
            }
            Err(_) => {
                warn!(user_id = %member.user_id, "Preference lookup timed out, mention skipped");
                None
            }
        }
    }
}
