//! Forum chat server
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use forum_auth::JwtAuthValidator;
use forum_core::config::AppConfig;
use forum_core::error::AppError;
use forum_core::traits::{AuthValidator, MessageHistory, MessagePersister};
use forum_database::{DatabasePool, MessageRepository};
use forum_realtime::{ChatHub, RetentionSweeper};

#[tokio::main]
async fn main() {
    let env = std::env::var("FORUM_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting forum chat server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    forum_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Collaborators ────────────────────────────────────
    let repository = Arc::new(MessageRepository::new(db.pool().clone()));
    let persister: Arc<dyn MessagePersister> = repository.clone();
    let history: Arc<dyn MessageHistory> = repository;
    let auth: Arc<dyn AuthValidator> = Arc::new(JwtAuthValidator::new(&config.auth));

    // ── Step 3: Chat hub ─────────────────────────────────────────
    let hub = ChatHub::start(&config.chat, auth, Arc::clone(&persister));
    tracing::info!(
        queue = config.chat.broadcast_queue_size,
        liveness_interval_seconds = config.chat.liveness_interval_seconds,
        "Chat hub started"
    );

    // ── Step 4: Retention sweeper ────────────────────────────────
    let mut sweeper = if config.retention.enabled {
        let mut sweeper = RetentionSweeper::new(Arc::clone(&persister), &config.retention);
        sweeper.start().await?;
        Some(sweeper)
    } else {
        tracing::info!("Message retention disabled");
        None
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let config = Arc::new(config);
    let state = forum_api::AppState::new(Arc::clone(&config), db.clone(), hub.clone(), history);
    let app = forum_api::build_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Forum chat server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    // The hub closes its sockets first so that axum's graceful shutdown
    // is not held open by long-lived WebSocket upgrades.
    let shutdown_hub = hub.clone();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            match tokio::time::timeout(grace, shutdown_hub.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Chat hub shutdown failed"),
                Err(_) => tracing::warn!(grace_seconds = grace.as_secs(), "Chat hub shutdown timed out"),
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 7: Background tasks ─────────────────────────────────
    if let Some(sweeper) = sweeper.as_mut() {
        if let Err(e) = sweeper.shutdown().await {
            tracing::warn!(error = %e, "Retention sweeper shutdown failed");
        }
    }
    db.close().await;

    tracing::info!("Forum chat server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
