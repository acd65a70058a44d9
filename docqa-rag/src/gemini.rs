//! Gemini embedding provider and chat model over the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::chat::ChatModel;
use crate::embedding::EmbeddingProvider;
use crate::error::{ChatError, RagError, Result};

/// The default Generative Language API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";

/// Output dimensionality of `embedding-001`.
const DEFAULT_DIMENSIONS: usize = 768;

const PROVIDER: &str = "Gemini";

/// Prefix a bare model id with `models/`, leaving qualified names alone.
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

/// Native output size of the published embedding models.
fn known_dimensions(model: &str) -> Option<usize> {
    match qualified_model(model).as_str() {
        "models/embedding-001" | "models/text-embedding-004" => Some(768),
        "models/gemini-embedding-001" => Some(3072),
        _ => None,
    }
}

fn method_url(base_url: &str, model: &str, method: &str) -> String {
    format!("{}/{}:{method}", base_url.trim_end_matches('/'), qualified_model(model))
}

/// The embedding task hint sent with every request.
///
/// Documents and queries use the same hint by default so both sides land in
/// the same vector space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Pull a readable message out of an error body, falling back to the raw body.
fn error_detail(body: String) -> String {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => match parsed.error.status {
            Some(status) => format!("{status}: {}", parsed.error.message),
            None => parsed.error.message,
        },
        Err(_) => body,
    }
}

fn parse_embedding(body: &str) -> Result<Vec<f32>> {
    let response: EmbedContentResponse =
        serde_json::from_str(body).map_err(|e| RagError::EmbeddingError {
            provider: PROVIDER.into(),
            message: format!("failed to parse response: {e}"),
        })?;
    Ok(response.embedding.values)
}

/// Concatenate the text parts of the first candidate.
fn parse_generated_text(body: &str) -> std::result::Result<String, ChatError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ChatError::MalformedResponse {
            provider: PROVIDER.into(),
            message: format!("failed to parse response: {e}"),
        })?;

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
    if texts.is_empty() {
        return Err(ChatError::MalformedResponse {
            provider: PROVIDER.into(),
            message: "response contained no text candidate".into(),
        });
    }
    Ok(texts.concat())
}

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` endpoint.
///
/// # Configuration
///
/// - `model` – defaults to `models/embedding-001`.
/// - `task_type` – defaults to [`TaskType::RetrievalDocument`] for both
///   ingestion and queries.
/// - `base_url` – defaults to [`GEMINI_API_BASE`].
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    task_type: TaskType,
    dimensions: usize,
    dimensions_pinned: bool,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider using the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: GEMINI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            task_type: TaskType::RetrievalDocument,
            dimensions: DEFAULT_DIMENSIONS,
            dimensions_pinned: false,
        })
    }

    /// Set the model name (e.g. `models/text-embedding-004`).
    ///
    /// Known models also update [`dimensions()`](EmbeddingProvider::dimensions)
    /// unless it was pinned with [`with_dimensions`](Self::with_dimensions).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        if !self.dimensions_pinned {
            if let Some(dims) = known_dimensions(&self.model) {
                self.dimensions = dims;
            }
        }
        self
    }

    /// Set the dimensionality reported by [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.dimensions_pinned = true;
        self
    }

    /// Set the task type used for embedding requests.
    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    /// Point the provider at a different API root (proxies, emulators).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn embed_request<'a>(&self, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: qualified_model(&self.model),
            content: Content { role: None, parts: vec![Part { text }] },
            task_type: self.task_type,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            text_len = text.len(),
            "embedding single text"
        );

        let body = self.embed_request(text);

        let response = self
            .client
            .post(method_url(&self.base_url, &self.model, "embedContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::EmbeddingError {
                    provider: PROVIDER.into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| RagError::EmbeddingError {
            provider: PROVIDER.into(),
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!("API returned {status}: {}", error_detail(body)),
            });
        }

        parse_embedding(&body)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`ChatModel`] backed by the Gemini `generateContent` endpoint.
pub struct GeminiChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiChatModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.into(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, ChatError> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            prompt_len = prompt.len(),
            "generating content"
        );

        let body = GenerateContentRequest {
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: prompt }] }],
        };

        let response = self
            .client
            .post(method_url(&self.base_url, &self.model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Network {
                provider: PROVIDER.into(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ChatError::Network {
            provider: PROVIDER.into(),
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            return Err(ChatError::from_status(PROVIDER, status.as_u16(), error_detail(body)));
        }

        parse_generated_text(&body)
    }
}
