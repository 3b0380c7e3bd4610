//! External Client Module
//!
//! Trait seams and HTTP implementations for the two external collaborators:
//! the vector index (passage retrieval) and the generation service
//! (chat completion). Everything beyond these contracts is out of scope;
//! the orchestrator only ever sees `RetrievedPassage` values and generated
//! text.

mod generation;
mod retrieval;

pub use generation::{AnswerGenerator, ChatCompletionClient};
pub use retrieval::{
    chapter_variants, ChapterScope, PassageFilter, PassageRetriever, PassageType,
    VectorIndexClient,
};

use thiserror::Error;

// == Retrieved Passage ==
/// A ranked passage returned by the vector index. Read-only to this crate;
/// consumed within a single request and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage {
    /// Passage body text
    pub text: String,
    /// Chapter identifier the passage was indexed under (e.g. "3.2")
    pub chapter_tag: String,
    /// Passage kind: "content" or "revision"
    pub type_tag: String,
}

// == Client Error ==
/// Failures crossing the boundary to an external service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network failure or timeout reaching the service
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a payload this crate cannot interpret
    #[error("unexpected response shape: {0}")]
    BadResponse(String),
}
