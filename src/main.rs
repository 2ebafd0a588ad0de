//! ChatHub Server — realtime chat fan-out and room presence
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use chathub_core::config::AppConfig;
use chathub_core::error::AppError;
use chathub_notify::{EmailQueue, EmailWorker, HttpMailer, Mailer, NoopMailer};
use chathub_realtime::Coordinator;
use chathub_store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() {
    let env = std::env::var("CHATHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
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
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ChatHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Store ────────────────────────────────────────────
    let store: Arc<dyn Store> = match config.store.provider.as_str() {
        "postgres" => {
            let pool = chathub_store::connection::DatabasePool::connect(&config.store.postgres)
                .await?
                .into_pool();
            chathub_store::migration::run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        "memory" => {
            tracing::warn!("Using in-memory store; nothing survives a restart");
            Arc::new(MemoryStore::new())
        }
        other => {
            return Err(AppError::configuration(format!(
                "Unknown store provider '{other}'"
            )));
        }
    };

    // ── Step 2: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 3: Email worker ─────────────────────────────────────
    let (emails, email_rx) = EmailQueue::new(config.notify.queue_capacity);
    let mailer: Arc<dyn Mailer> = match HttpMailer::from_config(&config.notify) {
        Some(mailer) => {
            tracing::info!("Email relay configured");
            Arc::new(mailer)
        }
        None => {
            tracing::info!("No email relay configured; emails will be logged and discarded");
            Arc::new(NoopMailer)
        }
    };
    let email_worker = EmailWorker::new(mailer, email_rx, &config.notify);
    let worker_handle = tokio::spawn(email_worker.run(shutdown_rx.clone()));

    // ── Step 4: Realtime coordinator ─────────────────────────────
    let coordinator = Arc::new(Coordinator::new(
        &config.realtime,
        &config.notify,
        Arc::clone(&store),
        emails,
    ));
    let reconciler_handle =
        tokio::spawn(Arc::clone(&coordinator).run_reconciler(shutdown_rx.clone()));

    // ── Step 5: HTTP server ──────────────────────────────────────
    let app_state = chathub_api::state::AppState {
        config: Arc::new(config.clone()),
        store,
        coordinator: Arc::clone(&coordinator),
    };
    let app = chathub_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("ChatHub server listening on {addr}");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");

    let grace = std::time::Duration::from_secs(config.server.shutdown_grace_seconds);
    let _ = tokio::time::timeout(grace, worker_handle).await;
    let _ = tokio::time::timeout(grace, reconciler_handle).await;

    tracing::info!("ChatHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
