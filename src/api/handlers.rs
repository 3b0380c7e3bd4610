//! API Handlers
//!
//! HTTP request handlers for each tutoring endpoint. Handlers validate,
//! delegate to the orchestrator, and wrap results into response DTOs;
//! content absence is communicated in-body, never by status code.

use std::sync::Arc;

use axum::{extract::State, Json};
use tokio::sync::RwLock;

use crate::cache::QueryCache;
use crate::engine::Orchestrator;
use crate::error::{Result, TutorError};
use crate::models::{
    AskResponse, CacheClearResponse, CacheStatsResponse, ChapterRequest, HealthResponse,
    QuestionRequest, RevisionResponse, SummarizeResponse,
};

/// Application state shared across all handlers.
///
/// The query cache is the only mutable shared resource; all mutation goes
/// through its own exclusion discipline. The orchestrator is injected so a
/// multi-instance deployment can swap the cache behind it without touching
/// the handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe query cache
    pub cache: Arc<RwLock<QueryCache>>,
    /// Request orchestrator over the cache and external clients
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Creates a new AppState from its injected components.
    pub fn new(cache: Arc<RwLock<QueryCache>>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            cache,
            orchestrator,
        }
    }
}

/// Handler for POST /summarize
///
/// Produces a bilingual summary of the requested chapter.
pub async fn summarize_handler(
    State(state): State<AppState>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<SummarizeResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(TutorError::Validation(error_msg));
    }

    let answer = state.orchestrator.summarize_chapter(&req.chapter).await?;
    Ok(Json(SummarizeResponse::new(req.chapter, answer)))
}

/// Handler for POST /revision
///
/// Answers every official revision question for the requested chapter.
/// A chapter without extractable questions returns an empty list, HTTP 200.
pub async fn revision_handler(
    State(state): State<AppState>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<RevisionResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(TutorError::Validation(error_msg));
    }

    let questions = state
        .orchestrator
        .answer_revision_questions(&req.chapter)
        .await?;
    Ok(Json(RevisionResponse::new(req.chapter, questions)))
}

/// Handler for POST /ask
///
/// Answers a free-form question about the material.
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<AskResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(TutorError::Validation(error_msg));
    }

    let answer = state.orchestrator.answer_question(&req.question).await?;
    Ok(Json(AskResponse::new(req.question, answer)))
}

/// Handler for POST /cache/clear
///
/// Removes all cached answers; used after underlying content updates to
/// force fresh generation.
pub async fn cache_clear_handler(State(state): State<AppState>) -> Json<CacheClearResponse> {
    let mut cache = state.cache.write().await;
    cache.clear();

    Json(CacheClearResponse::cleared())
}

/// Handler for GET /cache/stats
///
/// Read-only cache introspection.
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let cache = state.cache.read().await;
    let stats = cache.stats();

    Json(CacheStatsResponse {
        cached_queries: stats.entries,
        ttl_seconds: stats.ttl_seconds,
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
