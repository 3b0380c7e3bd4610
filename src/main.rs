//! SomaTutor - Bilingual retrieval-augmented tutoring server
//!
//! Binary entry point: loads configuration, wires the cache, clients, and
//! orchestrator together, and serves the REST API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soma_tutor::api::create_router;
use soma_tutor::cache::QueryCache;
use soma_tutor::clients::{ChatCompletionClient, VectorIndexClient};
use soma_tutor::{AppState, Config, Orchestrator};
use soma_tutor::spawn_cleanup_task;

/// Main entry point for the tutoring server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create query cache and external service clients
/// 4. Start background TTL cleanup task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soma_tutor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SomaTutor server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cache_ttl={}s, max_concurrent_generations={}, model={}",
        config.server_port,
        config.cache_ttl_seconds,
        config.max_concurrent_generations,
        config.generation_model
    );

    // Create the query cache and the external service clients
    let cache = Arc::new(RwLock::new(QueryCache::new(Duration::from_secs(
        config.cache_ttl_seconds,
    ))));
    let retriever =
        Arc::new(VectorIndexClient::new(&config).context("failed to build retrieval client")?);
    let generator =
        Arc::new(ChatCompletionClient::new(&config).context("failed to build generation client")?);
    let orchestrator = Arc::new(Orchestrator::new(
        cache.clone(),
        retriever,
        generator,
        config.max_concurrent_generations,
    ));
    let state = AppState::new(cache.clone(), orchestrator);
    info!("Query cache and clients initialized");

    // Start background cleanup task
    let cleanup_handle = spawn_cleanup_task(cache, config.cleanup_interval_seconds);
    info!("Background cleanup task started");

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind server port")?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the cleanup task
    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
