//! OpenAI-compatible embeddings client.
//!
//! Makes exactly one HTTP call per [`EmbeddingProvider::embed`]; retries and
//! caching are layered on by the analyzer.

use std::future::Future;
use std::time::Duration;

use hotelcheck_core::AppConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, EmbeddingFailure};
use crate::types::EmbeddingVector;

/// Error bodies are kept for diagnostics but cut to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Source of text embeddings.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text`, returning the vector unchanged from the backend.
    fn embed(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<EmbeddingVector, AnalysisError>> + Send;
}

/// Settings for [`OpenAiEmbeddingClient`].
#[derive(Clone)]
pub struct EmbeddingClientConfig {
    /// Base URL; `/embeddings` is appended.
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Requested output size. Responses of another size are rejected.
    pub dimensions: Option<usize>,
    pub timeout: Duration,
    /// Longer input is truncated to this many characters before sending.
    pub max_input_chars: usize,
}

impl EmbeddingClientConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_url: config.embedding_api_url.clone(),
            api_key: config.embedding_api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            timeout: Duration::from_secs(config.embedding_timeout_secs),
            max_input_chars: config.embedding_max_input_chars,
        }
    }
}

impl std::fmt::Debug for EmbeddingClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("timeout", &self.timeout)
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

/// HTTP client for a `POST {api_url}/embeddings` endpoint.
pub struct OpenAiEmbeddingClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    dimensions: Option<usize>,
    max_input_chars: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    model: &'a str,
    encoding_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingClient {
    /// Create a new client. No request is made and the API key is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: EmbeddingClientConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .user_agent("hotelcheck/0.1 (review-verification)")
            .build()
            .map_err(|e| AnalysisError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/embeddings", config.api_url.trim_end_matches('/')),
            api_key: config.api_key,
            model: config.model,
            dimensions: config.dimensions,
            max_input_chars: config.max_input_chars,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn parse_response(&self, bytes: &[u8]) -> Result<EmbeddingVector, EmbeddingFailure> {
        let response: EmbedResponse = serde_json::from_slice(bytes)
            .map_err(|e| EmbeddingFailure::Malformed(e.to_string()))?;

        let mut data = response.data.into_iter();
        let (Some(datum), None) = (data.next(), data.next()) else {
            return Err(EmbeddingFailure::Malformed(
                "expected exactly one embedding in `data`".to_string(),
            ));
        };

        if datum.embedding.is_empty() {
            return Err(EmbeddingFailure::Malformed("empty embedding".to_string()));
        }
        if datum.embedding.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingFailure::Malformed(
                "embedding contains non-finite values".to_string(),
            ));
        }
        if let Some(expected) = self.dimensions {
            if datum.embedding.len() != expected {
                return Err(EmbeddingFailure::Malformed(format!(
                    "expected {expected} dimensions, got {}",
                    datum.embedding.len()
                )));
            }
        }

        Ok(EmbeddingVector::new(datum.embedding))
    }
}

impl EmbeddingProvider for OpenAiEmbeddingClient {
    /// # Errors
    ///
    /// - [`AnalysisError::EmptyText`] for blank input.
    /// - [`AnalysisError::Configuration`] if no API key is configured.
    /// - [`AnalysisError::EmbeddingUnavailable`] on network failure, timeout,
    ///   non-2xx status, or a response without exactly one usable vector.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyText);
        }
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AnalysisError::Configuration(
                "OPENAI_API_KEY is not set; embeddings cannot be requested".to_string(),
            )
        })?;

        let input = truncate_chars(text, self.max_input_chars);
        if input.len() < text.len() {
            tracing::debug!(
                max_chars = self.max_input_chars,
                "embedding input truncated"
            );
        }

        let request = EmbedRequest {
            input,
            model: &self.model,
            encoding_format: "float",
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(EmbeddingFailure::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "embeddings endpoint returned error");
            return Err(EmbeddingFailure::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS).to_string(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(EmbeddingFailure::Http)?;
        Ok(self.parse_response(&bytes)?)
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
