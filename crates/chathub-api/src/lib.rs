//! # chathub-api
//!
//! The transport surface of ChatHub: the `/ws` WebSocket upgrade that
//! feeds the realtime coordinator, plus a small HTTP API for health and
//! room presence snapshots.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
