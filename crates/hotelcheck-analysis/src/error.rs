use thiserror::Error;

/// Why a call to the embeddings endpoint produced no vector.
#[derive(Debug, Error)]
pub enum EmbeddingFailure {
    /// Network failure, TLS failure, or the request timeout elapsing.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body did not have the expected embeddings shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbeddingFailure),

    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("degenerate vector: zero magnitude")]
    DegenerateVector,

    /// The hotel's parameter embedding could not be resolved, so none of its
    /// reviews can be scored.
    #[error("analysis unavailable for hotel {hotel_id}: {source}")]
    AnalysisUnavailable {
        hotel_id: String,
        #[source]
        source: Box<AnalysisError>,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("text to embed is empty")]
    EmptyText,
}

impl AnalysisError {
    /// Failures tied to one piece of text. Inside a hotel analysis these are
    /// reported on the affected review while the others are still scored.
    #[must_use]
    pub fn is_per_review(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmbeddingUnavailable(_)
                | AnalysisError::Configuration(_)
                | AnalysisError::EmptyText
        )
    }
}
