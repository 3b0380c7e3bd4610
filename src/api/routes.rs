//! API Routes
//!
//! Configures the Axum router with all tutoring endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    ask_handler, cache_clear_handler, cache_stats_handler, health_handler, revision_handler,
    summarize_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /summarize` - Bilingual summary of a chapter
/// - `POST /revision` - Answers to a chapter's revision questions
/// - `POST /ask` - Answer a free-form question
/// - `POST /cache/clear` - Drop all cached answers
/// - `GET /cache/stats` - Cache introspection
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/summarize", post(summarize_handler))
        .route("/revision", post(revision_handler))
        .route("/ask", post(ask_handler))
        .route("/cache/clear", post(cache_clear_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
