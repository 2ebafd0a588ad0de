//! Presence lifecycle tests: multi-tab accounting, idempotent cleanup,
//! and the HTTP snapshot endpoint.

mod helpers;

use http::StatusCode;

use chathub_realtime::{ClientEvent, ServerEvent};

#[tokio::test]
async fn test_multi_tab_user_stays_online_until_last_connection_leaves() {
    let app = helpers::TestApp::new();
    let alice = app.seed_user("alice");
    let room = app.seed_room("general", &[&alice]);

    let (c1, _rx1) = app.coordinator.connect(alice.id, "alice".to_string());
    let (c2, _rx2) = app.coordinator.connect(alice.id, "alice".to_string());

    app.coordinator
        .handle_event(&c1.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;
    app.coordinator
        .handle_event(&c2.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;

    // First tab disconnects; the user must remain present.
    app.coordinator.disconnect(&c1.id);
    assert_eq!(app.coordinator.online_users(&room.id), vec![alice.id]);

    let path = format!("/api/rooms/{}/online", room.id);
    let response = app.request("GET", &path, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body.get("users").unwrap().as_array().unwrap().len(),
        1
    );

    // Last tab disconnects; presence is gone.
    app.coordinator.disconnect(&c2.id);
    assert!(app.coordinator.online_users(&room.id).is_empty());

    let response = app.request("GET", &path, None).await;
    assert!(response.body.get("users").unwrap().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_disconnect_is_a_noop_without_extra_broadcasts() {
    let app = helpers::TestApp::new();
    let alice = app.seed_user("alice");
    let bob = app.seed_user("bob");
    let room = app.seed_room("general", &[&alice, &bob]);

    let (a, _a_rx) = app.coordinator.connect(alice.id, "alice".to_string());
    let (b, mut b_rx) = app.coordinator.connect(bob.id, "bob".to_string());

    app.coordinator
        .handle_event(&a.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;
    app.coordinator
        .handle_event(&b.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;
    helpers::drain_events(&mut b_rx);

    app.coordinator.disconnect(&a.id);
    let after_first = helpers::drain_events(&mut b_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::OnlineUsers { .. }))
        .count();
    assert_eq!(after_first, 1, "one presence broadcast per disconnect");

    // Disconnecting again changes nothing and broadcasts nothing.
    app.coordinator.disconnect(&a.id);
    let after_second = helpers::drain_events(&mut b_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::OnlineUsers { .. }))
        .count();
    assert_eq!(after_second, 0);
}

#[tokio::test]
async fn test_join_broadcasts_full_snapshot_to_the_room() {
    let app = helpers::TestApp::new();
    let alice = app.seed_user("alice");
    let bob = app.seed_user("bob");
    let room = app.seed_room("general", &[&alice, &bob]);

    let (a, mut a_rx) = app.coordinator.connect(alice.id, "alice".to_string());
    app.coordinator
        .handle_event(&a.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;

    let (b, _b_rx) = app.coordinator.connect(bob.id, "bob".to_string());
    helpers::drain_events(&mut a_rx);
    app.coordinator
        .handle_event(&b.id, ClientEvent::JoinRoom { room_id: room.id })
        .await;

    // Alice sees the full updated set, not a delta.
    let snapshots: Vec<Vec<_>> = helpers::drain_events(&mut a_rx)
        .into_iter()
        .filter_map(|e| match e {
            ServerEvent::OnlineUsers { users, .. } => Some(users),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].len(), 2);
    assert!(snapshots[0].contains(&alice.id));
    assert!(snapshots[0].contains(&bob.id));
}

#[tokio::test]
async fn test_leave_room_keeps_other_rooms_joined() {
    let app = helpers::TestApp::new();
    let alice = app.seed_user("alice");
    let r1 = app.seed_room("one", &[&alice]);
    let r2 = app.seed_room("two", &[&alice]);

    let (conn, _rx) = app.coordinator.connect(alice.id, "alice".to_string());
    app.coordinator
        .handle_event(&conn.id, ClientEvent::JoinRoom { room_id: r1.id })
        .await;
    app.coordinator
        .handle_event(&conn.id, ClientEvent::JoinRoom { room_id: r2.id })
        .await;

    app.coordinator
        .handle_event(&conn.id, ClientEvent::LeaveRoom { room_id: r1.id })
        .await;

    assert!(app.coordinator.online_users(&r1.id).is_empty());
    assert_eq!(app.coordinator.online_users(&r2.id), vec![alice.id]);
}
