//! Response DTOs for the tutoring API
//!
//! Defines the structure of outgoing HTTP response bodies. Every response is
//! structurally complete even under partial failure; missing content is
//! represented by fallback placeholder strings, never by absent fields.

use serde::Serialize;

/// A fully formed bilingual answer. Both fields are always present; the
/// Swahili side carries the fixed fallback placeholder when translation or
/// generation failed. Immutable once constructed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BilingualAnswer {
    pub english: String,
    pub swahili: String,
}

impl BilingualAnswer {
    pub fn new(english: impl Into<String>, swahili: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            swahili: swahili.into(),
        }
    }
}

/// One answered revision question within the batch flow, ordered by original
/// question position.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RevisionItem {
    /// Cleaned question text
    pub question_text: String,
    /// Swahili rendering of the question (English text when translation failed)
    pub swahili_question: String,
    pub answer: BilingualAnswer,
}

/// Response body for POST /summarize
#[derive(Debug, Clone, Serialize)]
pub struct SummarizeResponse {
    pub mode: String,
    pub chapter: String,
    pub response: BilingualAnswer,
}

impl SummarizeResponse {
    pub fn new(chapter: impl Into<String>, response: BilingualAnswer) -> Self {
        Self {
            mode: "summarize".to_string(),
            chapter: chapter.into(),
            response,
        }
    }
}

/// Response body for POST /revision
#[derive(Debug, Clone, Serialize)]
pub struct RevisionResponse {
    pub mode: String,
    pub chapter: String,
    pub questions: Vec<RevisionItem>,
}

impl RevisionResponse {
    pub fn new(chapter: impl Into<String>, questions: Vec<RevisionItem>) -> Self {
        Self {
            mode: "revision".to_string(),
            chapter: chapter.into(),
            questions,
        }
    }
}

/// Response body for POST /ask
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub mode: String,
    pub question_text: String,
    pub response: BilingualAnswer,
}

impl AskResponse {
    pub fn new(question_text: impl Into<String>, response: BilingualAnswer) -> Self {
        Self {
            mode: "ask".to_string(),
            question_text: question_text.into(),
            response,
        }
    }
}

/// Response body for POST /cache/clear
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearResponse {
    pub status: String,
}

impl CacheClearResponse {
    pub fn cleared() -> Self {
        Self {
            status: "cache cleared".to_string(),
        }
    }
}

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    /// Number of live cached queries
    pub cached_queries: usize,
    /// Configured time-to-live in seconds
    pub ttl_seconds: u64,
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
