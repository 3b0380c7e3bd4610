//! Request DTOs for the tutoring API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for chapter-scoped operations (POST /summarize, POST /revision)
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterRequest {
    /// Chapter identifier, e.g. "2" or "2.3"
    pub chapter: String,
}

impl ChapterRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.chapter.trim().is_empty() {
            return Some("Field 'chapter' must not be empty".to_string());
        }
        None
    }
}

/// Request body for free-form questions (POST /ask)
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    /// The question text
    pub question: String,
}

impl QuestionRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.question.trim().is_empty() {
            return Some("Field 'question' must not be empty".to_string());
        }
        None
    }
}
