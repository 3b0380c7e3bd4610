//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The vector index and generation credentials have no usable defaults and must
/// be set for the external clients to reach their services.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Query cache TTL in seconds
    pub cache_ttl_seconds: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval_seconds: u64,
    /// Maximum simultaneous generation calls in flight (batch fan-out cap)
    pub max_concurrent_generations: usize,
    /// Timeout applied to every external HTTP call, in seconds
    pub request_timeout_seconds: u64,
    /// Base URL of the vector index query endpoint
    pub vector_index_url: String,
    /// API key for the vector index
    pub vector_index_api_key: String,
    /// Namespace selector for the vector index; empty selects the default partition
    pub vector_index_namespace: String,
    /// Base URL of the generation service (OpenAI-style API)
    pub generation_api_url: String,
    /// API key for the generation service
    pub generation_api_key: String,
    /// Chat-completion model identifier
    pub generation_model: String,
    /// Maximum tokens per generated answer
    pub generation_max_tokens: u32,
    /// Embedding model used to vectorize retrieval queries
    pub embedding_model: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `CACHE_TTL_SECONDS` - Query cache TTL (default: 600)
    /// - `CLEANUP_INTERVAL_SECONDS` - Cleanup frequency (default: 60)
    /// - `MAX_CONCURRENT_GENERATIONS` - Batch fan-out cap (default: 5)
    /// - `REQUEST_TIMEOUT_SECONDS` - External call timeout (default: 60)
    /// - `VECTOR_INDEX_URL` / `VECTOR_INDEX_API_KEY` - Vector index identity
    /// - `VECTOR_INDEX_NAMESPACE` - Index partition selector (default: empty)
    /// - `GENERATION_API_URL` / `GENERATION_API_KEY` - Generation service identity
    /// - `GENERATION_MODEL` - Chat model (default: gpt-4o-mini)
    /// - `GENERATION_MAX_TOKENS` - Answer token cap (default: 2000)
    /// - `EMBEDDING_MODEL` - Query embedding model (default: text-embedding-3-small)
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.server_port),
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.cache_ttl_seconds),
            cleanup_interval_seconds: env::var("CLEANUP_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.cleanup_interval_seconds),
            max_concurrent_generations: env::var("MAX_CONCURRENT_GENERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_concurrent_generations),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_timeout_seconds),
            vector_index_url: env::var("VECTOR_INDEX_URL").unwrap_or(default.vector_index_url),
            vector_index_api_key: env::var("VECTOR_INDEX_API_KEY")
                .unwrap_or(default.vector_index_api_key),
            vector_index_namespace: env::var("VECTOR_INDEX_NAMESPACE")
                .unwrap_or(default.vector_index_namespace),
            generation_api_url: env::var("GENERATION_API_URL").unwrap_or(default.generation_api_url),
            generation_api_key: env::var("GENERATION_API_KEY")
                .unwrap_or(default.generation_api_key),
            generation_model: env::var("GENERATION_MODEL").unwrap_or(default.generation_model),
            generation_max_tokens: env::var("GENERATION_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.generation_max_tokens),
            embedding_model: env::var("EMBEDDING_MODEL").unwrap_or(default.embedding_model),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            cache_ttl_seconds: 600,
            cleanup_interval_seconds: 60,
            max_concurrent_generations: 5,
            request_timeout_seconds: 60,
            vector_index_url: String::new(),
            vector_index_api_key: String::new(),
            vector_index_namespace: String::new(),
            generation_api_url: "https://api.openai.com/v1".to_string(),
            generation_api_key: String::new(),
            generation_model: "gpt-4o-mini".to_string(),
            generation_max_tokens: 2000,
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}
