//! Engine Module
//!
//! Coordinates the query cache and the two external clients into answered
//! requests: cache lookup, retrieval, prompt assembly, generation, and the
//! bounded fan-out for revision batches.

mod orchestrator;

pub use orchestrator::{Orchestrator, ANSWER_UNAVAILABLE};
