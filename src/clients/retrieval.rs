//! Retrieval Client
//!
//! Similarity search over the external vector index. The production client
//! embeds the query text through the generation service's embeddings
//! endpoint, then issues a metadata-filtered vector query against a
//! Pinecone-style REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::clients::{ClientError, RetrievedPassage};
use crate::config::Config;

// == Passage Filter ==
/// Passage kind stored in index metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassageType {
    /// Textbook body content
    Content,
    /// Official end-of-chapter revision questions
    Revision,
}

impl PassageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassageType::Content => "content",
            PassageType::Revision => "revision",
        }
    }
}

/// Chapter scoping applied to a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterScope {
    /// No chapter restriction
    Any,
    /// A single chapter or subchapter id, e.g. "3.2"
    Exact(String),
    /// A chapter id and its dotted subchapters, e.g. "3" covers "3.1".."3.9"
    Variants(String),
    /// Every subchapter under a chapter root
    Root(String),
}

/// Metadata filter for a retrieval call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassageFilter {
    pub passage_type: PassageType,
    pub scope: ChapterScope,
}

impl PassageFilter {
    pub fn content(scope: ChapterScope) -> Self {
        Self {
            passage_type: PassageType::Content,
            scope,
        }
    }

    pub fn revision(scope: ChapterScope) -> Self {
        Self {
            passage_type: PassageType::Revision,
            scope,
        }
    }

    /// Renders the filter as index metadata conditions.
    fn to_metadata(&self) -> Value {
        let mut conditions = json!({
            "type": { "$eq": self.passage_type.as_str() }
        });
        match &self.scope {
            ChapterScope::Any => {}
            ChapterScope::Exact(chapter) => {
                conditions["chapter"] = json!({ "$eq": chapter });
            }
            ChapterScope::Variants(chapter) => {
                conditions["chapter"] = json!({ "$in": chapter_variants(chapter) });
            }
            ChapterScope::Root(root) => {
                conditions["chapter_root"] = json!({ "$eq": root_of(root) });
            }
        }
        conditions
    }
}

/// Expands a bare chapter id into its dotted subchapter variants
/// ("3" -> ["3", "3.1", .., "3.9"]); dotted ids are already precise.
pub fn chapter_variants(chapter: &str) -> Vec<String> {
    let id = chapter.trim();
    if id.contains('.') {
        return vec![id.to_string()];
    }
    let mut variants = vec![id.to_string()];
    variants.extend((1..10).map(|i| format!("{}.{}", id, i)));
    variants
}

fn root_of(chapter: &str) -> String {
    chapter
        .trim()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

// == Retriever Trait ==
/// Similarity search over pre-indexed curriculum passages.
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    /// Returns up to `top_k` passages ranked by similarity to `query`,
    /// restricted by `filter`.
    async fn search(
        &self,
        query: &str,
        filter: &PassageFilter,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, ClientError>;
}

// == Vector Index Client ==
/// REST client for the hosted vector index.
pub struct VectorIndexClient {
    http: reqwest::Client,
    index_url: String,
    index_api_key: String,
    /// Index partition selector; pass-through, not interpreted here
    namespace: Option<String>,
    embeddings_url: String,
    embeddings_api_key: String,
    embedding_model: String,
}

impl VectorIndexClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        let namespace = if config.vector_index_namespace.is_empty() {
            None
        } else {
            Some(config.vector_index_namespace.clone())
        };

        Ok(Self {
            http,
            index_url: config.vector_index_url.trim_end_matches('/').to_string(),
            index_api_key: config.vector_index_api_key.clone(),
            namespace,
            embeddings_url: config.generation_api_url.trim_end_matches('/').to_string(),
            embeddings_api_key: config.generation_api_key.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    /// Vectorizes the query text through the embeddings endpoint.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });

        let response: EmbeddingsResponse = self
            .http
            .post(format!("{}/embeddings", self.embeddings_url))
            .bearer_auth(&self.embeddings_api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ClientError::BadResponse("embeddings response had no data".to_string()))
    }
}

#[async_trait]
impl PassageRetriever for VectorIndexClient {
    async fn search(
        &self,
        query: &str,
        filter: &PassageFilter,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, ClientError> {
        let vector = self.embed(query).await?;

        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "filter": filter.to_metadata(),
        });
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }

        let response: QueryResponse = self
            .http
            .post(format!("{}/query", self.index_url))
            .header("Api-Key", &self.index_api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let passages: Vec<RetrievedPassage> = response
            .matches
            .into_iter()
            .filter_map(|m| m.metadata)
            .filter(|meta| !meta.page_content.trim().is_empty())
            .map(|meta| RetrievedPassage {
                text: meta.page_content,
                chapter_tag: meta.chapter,
                type_tag: meta.passage_type,
            })
            .collect();

        debug!(
            "retrieved {} passages for filter {:?}",
            passages.len(),
            filter
        );
        Ok(passages)
    }
}

// == Wire Types ==
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    metadata: Option<PassageMetadata>,
}

#[derive(Debug, Deserialize)]
struct PassageMetadata {
    #[serde(default)]
    page_content: String,
    #[serde(default)]
    chapter: String,
    #[serde(default, rename = "type")]
    passage_type: String,
}
