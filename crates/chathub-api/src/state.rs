//! Application state shared across all handlers.

use std::sync::Arc;

use chathub_core::config::AppConfig;
use chathub_realtime::Coordinator;
use chathub_store::Store;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Message store
    pub store: Arc<dyn Store>,
    /// Realtime coordinator
    pub coordinator: Arc<Coordinator>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
