use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// YAML hotel catalog; the built-in sample catalog is used when `None`.
    pub catalog_path: Option<PathBuf>,
    /// Base URL of the embeddings API, without the `/embeddings` suffix.
    pub embedding_api_url: String,
    /// Checked lazily, when the first embedding is requested.
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_dimensions: Option<usize>,
    pub embedding_timeout_secs: u64,
    pub embedding_max_input_chars: usize,
    pub embedding_max_retries: u32,
    pub embedding_retry_backoff_ms: u64,
    /// Reviews scoring strictly below this similarity require verification.
    pub similarity_threshold: f32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("embedding_api_url", &self.embedding_api_url)
            .field(
                "embedding_api_key",
                &self.embedding_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .field("embedding_timeout_secs", &self.embedding_timeout_secs)
            .field(
                "embedding_max_input_chars",
                &self.embedding_max_input_chars,
            )
            .field("embedding_max_retries", &self.embedding_max_retries)
            .field(
                "embedding_retry_backoff_ms",
                &self.embedding_retry_backoff_ms,
            )
            .field("similarity_threshold", &self.similarity_threshold)
            .finish()
    }
}
