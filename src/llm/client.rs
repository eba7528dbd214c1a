//! Async client for an Ollama-compatible text-generation service
//!
//! Calls are non-streaming. Each reply carries an opaque context vector
//! that is handed back on the next call to continue the same conversation.

use crate::core::config::{GenerationConfig, KeepAlive};
use crate::core::error::{ReplayError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Opaque conversation state returned by the generation service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunningContext(pub Vec<i64>);

impl RunningContext {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A single completed generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// The generated reply text
    pub text: String,
    /// Context to pass to the next call
    pub context: RunningContext,
    /// Reasoning trace, for models that emit one separately
    pub thinking: Option<String>,
}

/// Anything that can turn a prompt (plus running context) into text
///
/// `OllamaClient` is the production implementation; tests script replies.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str, context: &RunningContext) -> Result<Generation>;
}

/// HTTP client for the `/api/generate` endpoint
pub struct OllamaClient {
    client: Client,
    base_url: String,
    config: GenerationConfig,
}

impl OllamaClient {
    /// Create a new client with explicit host and generation settings
    pub fn new(base_url: impl Into<String>, config: GenerationConfig) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            config,
        }
    }

    /// Create a client using `OLLAMA_HOST` (defaults to the local server)
    pub fn from_env(config: GenerationConfig) -> Self {
        let base_url =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".into());
        Self::new(base_url, config)
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn build_request<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a RunningContext,
        num_predict: Option<u32>,
    ) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            context: if context.is_empty() {
                None
            } else {
                Some(&context.0)
            },
            options: GenerateOptions {
                num_ctx: self.config.context_size,
                temperature: self.config.temperature,
                num_predict: num_predict.unwrap_or(self.config.max_tokens),
            },
            keep_alive: self.config.keep_alive.as_ref(),
        }
    }

    /// Generate with a one-off cap on the number of produced tokens
    pub async fn generate_with_limit(
        &self,
        prompt: &str,
        context: &RunningContext,
        num_predict: Option<u32>,
    ) -> Result<Generation> {
        let request = self.build_request(prompt, context, num_predict);

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| ReplayError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReplayError::LlmError(format!("API error: {}", error_text)));
        }

        let completion: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ReplayError::LlmError(e.to_string()))?;

        tracing::debug!(
            model = %self.config.model,
            context_len = completion.context.len(),
            "generation complete"
        );

        Ok(Generation {
            text: completion.response,
            context: RunningContext(completion.context),
            thinking: completion.thinking,
        })
    }
}

impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, context: &RunningContext) -> Result<Generation> {
        self.generate_with_limit(prompt, context, None).await
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Vec<i64>>,
    options: GenerateOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<&'a KeepAlive>,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_ctx: u32,
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    context: Vec<i64>,
    #[serde(default)]
    thinking: Option<String>,
}
