//! Generation Client
//!
//! Chat-completion calls to the hosted generation service. One prompt in,
//! one block of generated text out; prompt assembly and bilingual parsing
//! live elsewhere.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::clients::ClientError;
use crate::config::Config;

/// Sampling temperature for answer generation.
const GENERATION_TEMPERATURE: f32 = 0.3;

// == Generator Trait ==
/// Produces natural-language text from an assembled prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError>;
}

// == Chat Completion Client ==
/// REST client for an OpenAI-style chat-completions endpoint.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_url: config.generation_api_url.trim_end_matches('/').to_string(),
            api_key: config.generation_api_key.clone(),
            model: config.generation_model.clone(),
            max_tokens: config.generation_max_tokens,
        })
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionClient {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        debug!("calling generation service, model: {}", self.model);

        let body = json!({
            "model": self.model,
            "temperature": GENERATION_TEMPERATURE,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response: ChatCompletionResponse = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ClientError::BadResponse("completion response had no message content".to_string())
            })?;

        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::BadResponse(
                "completion response was empty".to_string(),
            ));
        }

        Ok(content.to_string())
    }
}

// == Wire Types ==
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}
