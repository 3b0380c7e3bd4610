//! API Module
//!
//! HTTP handlers and routing for the tutoring REST API.
//!
//! # Endpoints
//! - `POST /summarize` - Bilingual summary of a chapter
//! - `POST /revision` - Answers to a chapter's revision questions
//! - `POST /ask` - Answer a free-form question
//! - `POST /cache/clear` - Drop all cached answers
//! - `GET /cache/stats` - Cache introspection
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
