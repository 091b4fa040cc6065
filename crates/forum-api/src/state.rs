//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use forum_core::config::AppConfig;
use forum_core::traits::MessageHistory;
use forum_database::DatabasePool;
use forum_realtime::ChatHub;

/// Shared application state passed to all Axum handlers via `State`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Database pool
    pub db: DatabasePool,
    /// Chat hub
    pub hub: ChatHub,
    /// Stored message reads
    pub history: Arc<dyn MessageHistory>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}

impl AppState {
    /// Bundle the shared services.
    pub fn new(
        config: Arc<AppConfig>,
        db: DatabasePool,
        hub: ChatHub,
        history: Arc<dyn MessageHistory>,
    ) -> Self {
        Self {
            config,
            db,
            hub,
            history,
            started_at: Instant::now(),
        }
    }
}
