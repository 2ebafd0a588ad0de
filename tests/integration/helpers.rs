//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use chathub_api::state::AppState;
use chathub_core::config::AppConfig;
use chathub_core::types::id::{RoomId, UserId};
use chathub_entity::notification::RoomNotificationPreference;
use chathub_entity::room::Room;
use chathub_entity::user::User;
use chathub_notify::{EmailMessage, EmailQueue};
use chathub_realtime::Coordinator;
use chathub_store::MemoryStore;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Realtime coordinator, for driving connections directly
    pub coordinator: Arc<Coordinator>,
    /// Seedable in-memory store
    pub store: Arc<MemoryStore>,
    /// Receiver end of the email queue
    pub emails: mpsc::Receiver<EmailMessage>,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application on an in-memory store
    pub fn new() -> Self {
        let config = AppConfig::default();
        let store = Arc::new(MemoryStore::new());
        let (queue, emails) = EmailQueue::new(64);
        let coordinator = Arc::new(Coordinator::new(
            &config.realtime,
            &config.notify,
            store.clone(),
            queue,
        ));

        let state = AppState {
            config: Arc::new(config.clone()),
            store: store.clone(),
            coordinator: Arc::clone(&coordinator),
        };
        let router = chathub_api::router::build_router(state);

        Self {
            router,
            coordinator,
            store,
            emails,
            config,
        }
    }

    /// Seed a user with an email address and return it
    pub fn seed_user(&self, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            email: Some(format!("{username}@test.com")),
            avatar_url: None,
            notifications_enabled: true,
            created_at: now,
            updated_at: now,
        };
        self.store.add_user(user.clone());
        user
    }

    /// Seed a room with the given members
    pub fn seed_room(&self, name: &str, members: &[&User]) -> Room {
        let room = Room {
            id: RoomId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.store.add_room(room.clone());
        for member in members {
            self.store.add_member(room.id, member.id);
        }
        room
    }

    /// Set a notification preference
    pub fn set_preference(&self, user: &User, room: &Room, preference: RoomNotificationPreference) {
        self.store.set_preference(user.id, room.id, preference);
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// Drain all currently queued events from a connection receiver
pub fn drain_events(
    rx: &mut mpsc::Receiver<chathub_realtime::ServerEvent>,
) -> Vec<chathub_realtime::ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
