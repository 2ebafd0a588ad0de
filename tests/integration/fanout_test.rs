//! End-to-end fan-out tests: send, broadcast, and notification dispatch
//! driven through the coordinator against a seeded store.

mod helpers;

use std::time::Duration;

use chathub_entity::notification::RoomNotificationPreference;
use chathub_realtime::{ClientEvent, ServerEvent};

fn new_message_contents(events: &[ServerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::NewMessage { message } => Some(message.content.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_send_reaches_every_joined_connection_exactly_once() {
    let app = helpers::TestApp::new();
    let alice = app.seed_user("alice");
    let bob = app.seed_user("bob");
    let room = app.seed_room("general", &[&alice, &bob]);

    let (a1, mut a1_rx) = app.coordinator.connect(alice.id, "alice".to_string());
    let (a2, mut a2_rx) = app.coordinator.connect(alice.id, "alice".to_string());
    let (b1, mut b1_rx) = app.coordinator.connect(bob.id, "bob".to_string());

    for conn in [&a1, &a2, &b1] {
        app.coordinator
            .handle_event(&conn.id, ClientEvent::JoinRoom { room_id: room.id })
            .await;
    }

    app.coordinator
        .handle_event(
            &b1.id,
            ClientEvent::SendMessage {
                room_id: room.id,
                content: "hello everyone".to_string(),
                emotion: Some("joy".to_string()),
                avatar_expression: Some("smile".to_string()),
                attachment_url: None,
                parent_id: None,
            },
        )
        .await;

    for rx in [&mut a1_rx, &mut a2_rx, &mut b1_rx] {
        let events = helpers::drain_events(rx);
        let contents = new_message_contents(&events);
        assert_eq!(contents, vec!["hello everyone"]);
        // Stored annotations are echoed back.
        let stored = events
            .iter()
            .find_map(|e| match e {
                ServerEvent::NewMessage { message } => Some(message),
                _ => None,
            })
            .unwrap();
        assert_eq!(stored.emotion.as_deref(), Some("joy"));
        assert_eq!(stored.avatar_expression.as_deref(), Some("smile"));
    }
}

#[tokio::test]
async fn test_plain_message_emails_exactly_the_offline_all_members() {
    let mut app = helpers::TestApp::new();
    let sender = app.seed_user("sender");
    let all_offline = app.seed_user("wants_all");
    let mentions_offline = app.seed_user("mentions_only");
    let room = app.seed_room("general", &[&sender, &all_offline, &mentions_offline]);

    app.set_preference(&all_offline, &room, RoomNotificationPreference::All);
    app.set_preference(&mentions_offline, &room, RoomNotificationPreference::Mentions);

    let (conn, _rx) = app.coordinator.connect(sender.id, "sender".to_string());
    app.coordinator
        .handle_event(&conn.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;

    app.coordinator
        .handle_event(
            &conn.id,
            ClientEvent::SendMessage {
                room_id: room.id,
                content: "plain message without mentions".to_string(),
                emotion: None,
                avatar_expression: None,
                attachment_url: None,
                parent_id: None,
            },
        )
        .await;

    let email = tokio::time::timeout(Duration::from_secs(2), app.emails.recv())
        .await
        .expect("notification pipeline runs")
        .expect("email enqueued");
    assert_eq!(email.to, "wants_all@test.com");
    assert!(email.subject.contains("general"));

    // Nothing for the mentions-only member.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(app.emails.try_recv().is_err());
}

#[tokio::test]
async fn test_mentioned_all_user_gets_two_emails_by_default() {
    let mut app = helpers::TestApp::new();
    let sender = app.seed_user("sender");
    let bob = app.seed_user("bob");
    let room = app.seed_room("general", &[&sender, &bob]);
    app.set_preference(&bob, &room, RoomNotificationPreference::All);

    let (conn, _rx) = app.coordinator.connect(sender.id, "sender".to_string());
    app.coordinator
        .handle_event(&conn.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;

    app.coordinator
        .handle_event(
            &conn.id,
            ClientEvent::SendMessage {
                room_id: room.id,
                content: "hey @bob".to_string(),
                emotion: None,
                avatar_expression: None,
                attachment_url: None,
                parent_id: None,
            },
        )
        .await;

    // Both pipelines email independently: one mention email, one room email.
    let first = tokio::time::timeout(Duration::from_secs(2), app.emails.recv())
        .await
        .expect("pipeline runs")
        .expect("mention email");
    let second = tokio::time::timeout(Duration::from_secs(2), app.emails.recv())
        .await
        .expect("pipeline runs")
        .expect("room email");

    assert_eq!(first.to, "bob@test.com");
    assert_eq!(second.to, "bob@test.com");
    assert_ne!(first.subject, second.subject);
}

#[tokio::test]
async fn test_mention_of_online_user_stays_in_app() {
    let mut app = helpers::TestApp::new();
    let sender = app.seed_user("sender");
    let bob = app.seed_user("bob");
    let room = app.seed_room("general", &[&sender, &bob]);

    let (s, _s_rx) = app.coordinator.connect(sender.id, "sender".to_string());
    let (_b, mut b_rx) = app.coordinator.connect(bob.id, "bob".to_string());

    app.coordinator
        .handle_event(&s.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;

    app.coordinator
        .handle_event(
            &s.id,
            ClientEvent::SendMessage {
                room_id: room.id,
                content: "ping @bob".to_string(),
                emotion: None,
                avatar_expression: None,
                attachment_url: None,
                parent_id: None,
            },
        )
        .await;

    // The mention arrives as a targeted event even though bob never joined
    // the room on this connection.
    let mention = tokio::time::timeout(Duration::from_secs(2), b_rx.recv())
        .await
        .expect("pipeline runs")
        .expect("event delivered");
    match mention {
        ServerEvent::MentionNotification { by, message } => {
            assert_eq!(by, "sender");
            assert_eq!(message.content, "ping @bob");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // No email for an online user.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(app.emails.try_recv().is_err());
}
