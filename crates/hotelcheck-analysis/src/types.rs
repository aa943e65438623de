use std::sync::Arc;

use serde::Serialize;

/// A text embedding. Cloning shares the underlying buffer; the values are
/// never mutated after the client returns them.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Arc<[f32]>);

impl EmbeddingVector {
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }
}

/// Verdict for a single similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    /// Raw cosine similarity in `[-1.0, 1.0]`.
    pub similarity: f32,
    /// Similarity as a display percentage, clamped to `[0, 100]`.
    pub score_percent: f32,
    pub requires_verification: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Scored(Classification),
    /// The review's embedding could not be resolved.
    Failed { error: String },
}

/// Result for one review of a hotel analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub review_id: String,
    pub hotel_id: String,
    pub review_text: String,
    /// Seed label carried over from the catalog for display. Scoring never
    /// reads it.
    pub is_anomalous: bool,
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

impl AnalysisResult {
    #[must_use]
    pub fn similarity(&self) -> Option<f32> {
        match &self.outcome {
            ReviewOutcome::Scored(c) => Some(c.similarity),
            ReviewOutcome::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn requires_verification(&self) -> Option<bool> {
        match &self.outcome {
            ReviewOutcome::Scored(c) => Some(c.requires_verification),
            ReviewOutcome::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ReviewOutcome::Failed { .. })
    }
}

/// All reviews of one hotel scored against its parameter text.
#[derive(Debug, Clone, Serialize)]
pub struct HotelAnalysis {
    pub hotel_id: String,
    pub parameter_text: String,
    pub threshold: f32,
    /// One entry per review, in the hotel's review order.
    pub results: Vec<AnalysisResult>,
}

impl HotelAnalysis {
    /// Reviews scored below the threshold.
    #[must_use]
    pub fn flagged_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.requires_verification() == Some(true))
            .count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_error()).count()
    }

    /// Reviews labelled anomalous in the catalog.
    #[must_use]
    pub fn seeded_anomalous_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_anomalous).count()
    }
}

/// Ad-hoc review text scored against a hotel.
#[derive(Debug, Clone, Serialize)]
pub struct CustomReviewAnalysis {
    pub hotel_id: String,
    pub review_text: String,
    pub threshold: f32,
    #[serde(flatten)]
    pub classification: Classification,
}
