//! Embedding-based review anomaly scoring for hotelcheck.
//!
//! Embeds a hotel's parameters (name, description, features) and each of its
//! reviews through an OpenAI-compatible endpoint, caches the vectors by exact
//! text, and flags reviews whose cosine similarity to the hotel falls below a
//! threshold as candidates for secret guest verification.

pub mod cache;
pub mod classifier;
pub mod embeddings;
pub mod error;
pub mod pipeline;
pub mod similarity;
pub mod types;

mod retry;

pub use cache::EmbeddingCache;
pub use classifier::{classify, DEFAULT_THRESHOLD};
pub use embeddings::{EmbeddingClientConfig, EmbeddingProvider, OpenAiEmbeddingClient};
pub use error::{AnalysisError, EmbeddingFailure};
pub use pipeline::{parameter_text, Analyzer, AnalyzerConfig};
pub use similarity::cosine_similarity;
pub use types::{
    AnalysisResult, Classification, CustomReviewAnalysis, EmbeddingVector, HotelAnalysis,
    ReviewOutcome,
};
