//! Integration tests for the HTTP surface: WebSocket upgrade rejection,
//! health, and presence snapshot endpoints.

mod helpers;

use http::StatusCode;

#[tokio::test]
async fn test_ws_upgrade_without_identity() {
    let app = helpers::TestApp::new();

    // WebSocket upgrade without an identity should fail
    let response = app.request("GET", "/ws", None).await;

    assert!(
        response.status == StatusCode::BAD_REQUEST
            || response.status == StatusCode::UNPROCESSABLE_ENTITY
            || response.status == StatusCode::UPGRADE_REQUIRED,
        "Expected 400, 422, or 426, got {}",
        response.status
    );
}

#[tokio::test]
async fn test_health_check() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.get("status").unwrap().as_str().unwrap(), "ok");
}

#[tokio::test]
async fn test_detailed_health_reports_engine_state() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/health/detailed", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body.get("ws_connections").unwrap().as_u64().unwrap(),
        0
    );
    assert_eq!(response.body.get("online_users").unwrap().as_u64().unwrap(), 0);
    assert!(response.body.get("metrics").is_some());
}

#[tokio::test]
async fn test_room_presence_snapshot_for_idle_room_is_empty() {
    let app = helpers::TestApp::new();
    let alice = app.seed_user("alice");
    let room = app.seed_room("general", &[&alice]);

    let path = format!("/api/rooms/{}/online", room.id);
    let response = app.request("GET", &path, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let users = response.body.get("users").unwrap().as_array().unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_room_presence_snapshot_for_unknown_room_is_not_found() {
    let app = helpers::TestApp::new();

    let path = format!("/api/rooms/{}/online", uuid::Uuid::new_v4());
    let response = app.request("GET", &path, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body.get("error").unwrap().as_str().unwrap(),
        "NOT_FOUND"
    );
}

#[tokio::test]
async fn test_room_presence_rejects_malformed_room_id() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/rooms/not-a-uuid/online", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
