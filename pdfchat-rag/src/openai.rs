//! OpenAI-compatible embedding and chat clients.
//!
//! Both clients talk to any server that implements the OpenAI REST shape
//! (`/embeddings`, `/chat/completions`): OpenAI itself, OpenRouter, vLLM,
//! Ollama's compatibility endpoint and so on.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::Generator;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The OpenRouter API base URL.
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// The default model for embeddings.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// The default chat model.
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    if timeout.is_zero() {
        return Err(RagError::ConfigError("request timeout must be greater than zero".into()));
    }
    reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
        error!(error = %e, "failed to build HTTP client");
        RagError::ConfigError(format!("failed to build HTTP client: {e}"))
    })
}

/// Pull the human-readable message out of an OpenAI-style error body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() { format!("request timed out: {e}") } else { format!("request failed: {e}") }
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// # Configuration
///
/// - `base_url` – defaults to `https://api.openai.com/v1`.
/// - `model` – defaults to `text-embedding-3-small`.
/// - `dimensions` – optional Matryoshka dimension override.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// Uses the default model (`text-embedding-3-small`) and dimensions (1536).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ConfigError("embedding API key must not be empty".into()));
        }

        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::ConfigError("OPENAI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Point the provider at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensions (Matryoshka support).
    ///
    /// When set, the API returns embeddings truncated to this size.
    /// This also updates the value returned by [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Set the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for a zero timeout or if the HTTP
    /// client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Order embedding data by its `index` field when the server provides one.
fn into_ordered_embeddings(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }
    data.into_iter().map(|d| d.embedding).collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("OpenAI", "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "OpenAI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "embeddings"))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "request failed");
                RagError::embedding("OpenAI", describe_request_error(&e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = "OpenAI", %status, "API error");
            return Err(RagError::embedding("OpenAI", format!("API returned {status}: {detail}")));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse response");
            RagError::embedding("OpenAI", format!("failed to parse response: {e}"))
        })?;

        Ok(into_ordered_embeddings(embedding_response.data))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// Configuration for [`OpenAIChatGenerator`].
#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier, e.g. `openai/gpt-4o-mini` on OpenRouter.
    pub model: String,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Optional maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Optional system message sent before the prompt.
    pub system_prompt: Option<String>,
    /// Extra headers, e.g. `HTTP-Referer` and `X-Title` for OpenRouter.
    pub headers: Vec<(String, String)>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenAIChatConfig {
    /// Config for the official OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            system_prompt: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Config for an OpenAI-compatible API at `base_url`.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(api_key, model).with_base_url(base_url)
    }

    /// Config for OpenRouter.
    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::compatible(api_key, OPENROUTER_API_BASE, model)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set a system message sent before every prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Add an extra HTTP header to every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for OpenAIChatConfig {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_CHAT_MODEL)
    }
}

/// A [`Generator`] backed by an OpenAI-compatible `/chat/completions` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::{OpenAIChatConfig, OpenAIChatGenerator};
///
/// let generator = OpenAIChatGenerator::new(
///     OpenAIChatConfig::openrouter(api_key, "openai/gpt-4o-mini")
///         .with_temperature(0.3)
///         .with_header("X-Title", "PDF Chat"),
/// )?;
/// ```
pub struct OpenAIChatGenerator {
    client: reqwest::Client,
    config: OpenAIChatConfig,
    headers: HeaderMap,
}

impl OpenAIChatGenerator {
    /// Create a generator from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the API key is empty, a header
    /// name or value is invalid, the timeout is zero or the HTTP client
    /// cannot be built.
    pub fn new(config: OpenAIChatConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::ConfigError("chat API key must not be empty".into()));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RagError::ConfigError(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RagError::ConfigError(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        Ok(Self { client: build_client(config.timeout)?, config, headers })
    }

    /// The configured model.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });

        ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Take the first choice's content out of a chat completion body.
fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RagError::generation("OpenAI", format!("failed to parse response: {e}")))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RagError::generation("OpenAI", "API returned no choices"))
}

#[async_trait]
impl Generator for OpenAIChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            provider = "OpenAI",
            model = %self.config.model,
            prompt_len = prompt.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(endpoint(&self.config.base_url, "chat/completions"))
            .bearer_auth(&self.config.api_key)
            .headers(self.headers.clone())
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "request failed");
                RagError::generation("OpenAI", describe_request_error(&e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to read response body");
            RagError::generation("OpenAI", describe_request_error(&e))
        })?;

        if !status.is_success() {
            error!(provider = "OpenAI", %status, "API error");
            return Err(RagError::generation(
                "OpenAI",
                format!("API returned {status}: {}", error_detail(body)),
            ));
        }

        parse_chat_response(&body)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
