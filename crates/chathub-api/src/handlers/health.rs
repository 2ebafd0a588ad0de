//! Health check handlers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use chathub_realtime::metrics::MetricsSnapshot;

use crate::state::AppState;

/// Basic health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the server answers.
    pub status: String,
    /// Server version.
    pub version: String,
}

/// Detailed health response with realtime engine statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Always "ok" when the server answers.
    pub status: String,
    /// Live WebSocket connections.
    pub ws_connections: usize,
    /// Distinct connected users.
    pub online_users: usize,
    /// Rooms with at least one joined connection.
    pub active_rooms: usize,
    /// Engine counters since start.
    pub metrics: MetricsSnapshot,
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/health/detailed
pub async fn detailed_health(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    Json(DetailedHealthResponse {
        status: "ok".to_string(),
        ws_connections: state.coordinator.connection_count(),
        online_users: state.coordinator.user_count(),
        active_rooms: state.coordinator.room_count(),
        metrics: state.coordinator.metrics(),
    })
}
