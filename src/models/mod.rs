//! Request and Response models for the tutoring API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{ChapterRequest, QuestionRequest};
pub use responses::{
    AskResponse, BilingualAnswer, CacheClearResponse, CacheStatsResponse, ErrorResponse,
    HealthResponse, RevisionItem, RevisionResponse, SummarizeResponse,
};
