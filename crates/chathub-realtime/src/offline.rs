//! Offline email notification for plain (non-mention) messages.

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
use crate::metrics::RealtimeMetrics;

/// Emails offline room members about a new message.
///
/// Stricter than mention dispatch: only the `all` preference qualifies —
/// online members already received the live broadcast and are never
/// emailed.
pub struct OfflineNotifier {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn Store>,
    emails: EmailQueue,
    metrics: Arc<RealtimeMetrics>,
    /// When true, skip members the mention pass already emailed for this
    /// message; when false both pipelines act independently (the
    /// historical behavior).
    coalesce_overlap: bool,
    store_timeout: Duration,
}

impl OfflineNotifier {
    /// Create a new offline notifier.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn Store>,
        emails: EmailQueue,
        metrics: Arc<RealtimeMetrics>,
        coalesce_overlap: bool,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            emails,
            metrics,
            coalesce_overlap,
            store_timeout,
        }
    }

    /// Consider every room member for an offline email about `message`.
    ///
    /// Runs on the fire-and-forget notification path: every failure is
    /// logged and swallowed.
    pub async fn notify_room(
        &self,
        message: &Message,
        members: &[RoomMember],
        room_name: &str,
        mention_emailed: &HashSet<UserId>,
    ) {
        for member in members {
            if member.user_id == message.sender.id {
                continue;
            }
            if self.registry.is_online(&member.user_id) {
                continue;
            }
            if !member.notifications_enabled {
                continue;
            }
            if self.coalesce_overlap && mention_emailed.contains(&member.user_id) {
                debug!(
                    user_id = %member.user_id,
                    message_id = %message.id,
                    "Room email coalesced into mention email"
                );
                continue;
            }

            let preference = match self.preference_for(member, message).await {
                Some(p) => p,
                None => continue,
            };
            if preference != RoomNotificationPreference::All {
                continue;
            }

            let Some(address) = &member.email else {
                debug!(user_id = %member.user_id, "Room email skipped, no address on file");
                continue;
            };

            let email = EmailMessage::room_message(
                address,
                &message.sender.username,
                room_name,
                &message.content,
            );
            if self.emails.enqueue(email) {
                self.metrics.email_enqueued();
                debug!(
                    user_id = %member.user_id,
                    message_id = %message.id,
                    "Room email enqueued"
                );
            }
        }
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
                warn!(user_id = %member.user_id, error = %e, "Preference lookup failed, room email skipped");
                None
            }
            Err(_) => {
                warn!(user_id = %member.user_id, "Preference lookup timed out, room email skipped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio::sync::mpsc;

    use chathub_core::types::id::{MessageId, RoomId};
    use chathub_entity::user::UserProfile;
    use chathub_store::MemoryStore;

    use crate::connection::handle::ConnectionHandle;

    use super::*;

    fn member(username: &str, email: Option<&str>) -> RoomMember {
        RoomMember {
            user_id: UserId::new(),
            username: username.to_string(),
            email: email.map(str::to_string),
            notifications_enabled: true,
        }
    }

    fn message(room_id: RoomId, sender: &RoomMember, content: &str) -> Message {
        Message {
            id: MessageId::new(),
            room_id,
            sender: UserProfile {
                id: sender.user_id,
                username: sender.username.clone(),
                avatar_url: None,
            },
            content: content.to_string(),
            emotion: None,
            avatar_expression: None,
            attachment_url: None,
            parent_id: None,
            pinned: false,
            read_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn notifier(
        registry: Arc<ConnectionRegistry>,
        store: Arc<MemoryStore>,
        coalesce_overlap: bool,
    ) -> (OfflineNotifier, mpsc::Receiver<EmailMessage>) {
        let (emails, email_rx) = EmailQueue::new(16);
        let notifier = OfflineNotifier::new(
            registry,
            store,
            emails,
            Arc::new(RealtimeMetrics::new()),
            coalesce_overlap,
            Duration::from_secs(5),
        );
        (notifier, email_rx)
    }

    #[tokio::test]
    async fn test_only_offline_all_preference_members_are_emailed() {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(MemoryStore::new());

        let room_id = RoomId::new();
        let a = member("a", Some("a@example.com"));
        let b = member("b", Some("b@example.com"));
        let c = member("c", Some("c@example.com"));
        store.set_preference(b.user_id, room_id, RoomNotificationPreference::All);
        store.set_preference(c.user_id, room_id, RoomNotificationPreference::Mentions);

        let (notifier, mut email_rx) = notifier(registry, store, false);
        let members = vec![a.clone(), b.clone(), c.clone()];
        let msg = message(room_id, &a, "plain message, no mentions");

        notifier
            .notify_room(&msg, &members, "general", &HashSet::new())
            .await;

        let email = email_rx.try_recv().expect("exactly one email");
        assert_eq!(email.to, "b@example.com");
        assert!(email_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_online_members_are_never_emailed() {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(MemoryStore::new());

        let room_id = RoomId::new();
        let a = member("a", Some("a@example.com"));
        let b = member("b", Some("b@example.com"));

        let (tx, _rx) = mpsc::channel(8);
        registry.register(Arc::new(ConnectionHandle::new(
            b.user_id,
            b.username.clone(),
            tx,
        )));

        let (notifier, mut email_rx) = notifier(registry, store, false);
        let members = vec![a.clone(), b];
        let msg = message(room_id, &a, "hello");

        notifier
            .notify_room(&msg, &members, "general", &HashSet::new())
            .await;

        assert!(email_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_coalesce_overlap_suppresses_second_email() {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(MemoryStore::new());

        let room_id = RoomId::new();
        let a = member("a", Some("a@example.com"));
        let b = member("b", Some("b@example.com"));
        let members = vec![a.clone(), b.clone()];
        let already = HashSet::from([b.user_id]);

        // Coalescing on: the mention email is the only one.
        let (coalescing, mut coalesced_rx) =
            notifier(registry.clone(), store.clone(), true);
        coalescing
            .notify_room(&message(room_id, &a, "hi @b"), &members, "general", &already)
            .await;
        assert!(coalesced_rx.try_recv().is_err());

        // Coalescing off: both pipelines email independently.
        let (independent, mut independent_rx) = notifier(registry, store, false);
        independent
            .notify_room(&message(room_id, &a, "hi @b"), &members, "general", &already)
            .await;
        assert!(independent_rx.try_recv().is_ok());
    }
}
