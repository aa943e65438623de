//! Review analysis orchestration.

use std::sync::Arc;

use hotelcheck_core::{AppConfig, Hotel, Review};

use crate::cache::EmbeddingCache;
use crate::classifier::{classify, DEFAULT_THRESHOLD};
use crate::embeddings::EmbeddingProvider;
use crate::error::AnalysisError;
use crate::retry::retry_with_backoff;
use crate::similarity::cosine_similarity;
use crate::types::{
    AnalysisResult, Classification, CustomReviewAnalysis, EmbeddingVector, HotelAnalysis,
    ReviewOutcome,
};

/// Tuning for [`Analyzer`].
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    pub threshold: f32,
    /// Additional attempts for a transient embedding failure.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

impl AnalyzerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            max_retries: config.embedding_max_retries,
            retry_backoff_ms: config.embedding_retry_backoff_ms,
        }
    }
}

/// Build the text a hotel's reviews are compared against.
///
/// `"{name}. {description} Features: {f1}, {f2}, ..."`, with features in
/// stored order. The feature clause is omitted when there are none.
#[must_use]
pub fn parameter_text(hotel: &Hotel) -> String {
    let mut text = format!("{}. {}", hotel.name.trim(), hotel.description.trim());
    if !hotel.features.is_empty() {
        text.push_str(" Features: ");
        text.push_str(&hotel.features.join(", "));
    }
    text
}

/// Scores reviews against hotel parameters.
///
/// The cache is shared: hand the same `Arc<EmbeddingCache>` to every analyzer
/// that should reuse embeddings.
pub struct Analyzer<P> {
    provider: P,
    cache: Arc<EmbeddingCache>,
    config: AnalyzerConfig,
}

impl<P: EmbeddingProvider> Analyzer<P> {
    #[must_use]
    pub fn new(provider: P, cache: Arc<EmbeddingCache>, config: AnalyzerConfig) -> Self {
        Self {
            provider,
            cache,
            config,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Score every review of `hotel` against its parameter text.
    ///
    /// 1. Build the parameter text and resolve its embedding (cached).
    /// 2. For each review in order: resolve its embedding (cached), compute
    ///    cosine similarity against the baseline, and classify it.
    ///
    /// A review whose embedding cannot be resolved is reported as a failed
    /// entry and the remaining reviews are still scored. Reviews belonging to
    /// another hotel are skipped.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::AnalysisUnavailable`] if the parameter embedding
    ///   cannot be resolved; the cause is attached.
    /// - [`AnalysisError::DimensionMismatch`] / [`AnalysisError::DegenerateVector`]
    ///   if a review vector cannot be compared with the baseline.
    pub async fn analyze_hotel(
        &self,
        hotel: &Hotel,
        reviews: &[&Review],
    ) -> Result<HotelAnalysis, AnalysisError> {
        let (parameter_text, baseline) = self.baseline(hotel).await?;

        let mut results = Vec::with_capacity(reviews.len());
        for review in reviews {
            if review.hotel_id != hotel.id {
                tracing::warn!(
                    hotel_id = %hotel.id,
                    review_id = %review.id,
                    owner = %review.hotel_id,
                    "skipping review that belongs to another hotel"
                );
                continue;
            }

            let outcome = match self.resolve(&review.text).await {
                Ok(embedding) => {
                    let classification = self.score(&baseline, &embedding)?;
                    tracing::debug!(
                        hotel_id = %hotel.id,
                        review_id = %review.id,
                        similarity = classification.similarity,
                        requires_verification = classification.requires_verification,
                        "review scored"
                    );
                    ReviewOutcome::Scored(classification)
                }
                Err(e) if e.is_per_review() => {
                    tracing::warn!(
                        hotel_id = %hotel.id,
                        review_id = %review.id,
                        error = %e,
                        "review embedding failed; continuing with remaining reviews"
                    );
                    ReviewOutcome::Failed {
                        error: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };

            results.push(AnalysisResult {
                review_id: review.id.clone(),
                hotel_id: hotel.id.clone(),
                review_text: review.text.clone(),
                is_anomalous: review.is_anomalous,
                outcome,
            });
        }

        let analysis = HotelAnalysis {
            hotel_id: hotel.id.clone(),
            parameter_text,
            threshold: self.config.threshold,
            results,
        };

        tracing::info!(
            hotel_id = %hotel.id,
            reviews = analysis.results.len(),
            flagged = analysis.flagged_count(),
            failed = analysis.failed_count(),
            "hotel analysis complete"
        );

        Ok(analysis)
    }

    /// Score ad-hoc review text against `hotel`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::AnalysisUnavailable`] if the parameter embedding
    ///   cannot be resolved.
    /// - [`AnalysisError::EmptyText`] for blank review text.
    /// - [`AnalysisError::EmbeddingUnavailable`] if the review embedding fails.
    /// - [`AnalysisError::DimensionMismatch`] / [`AnalysisError::DegenerateVector`]
    ///   if the vectors cannot be compared.
    pub async fn analyze_custom_review(
        &self,
        hotel: &Hotel,
        text: &str,
    ) -> Result<CustomReviewAnalysis, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyText);
        }

        let (_, baseline) = self.baseline(hotel).await?;
        let embedding = self.resolve(text).await?;
        let classification = self.score(&baseline, &embedding)?;

        tracing::info!(
            hotel_id = %hotel.id,
            similarity = classification.similarity,
            requires_verification = classification.requires_verification,
            "custom review scored"
        );

        Ok(CustomReviewAnalysis {
            hotel_id: hotel.id.clone(),
            review_text: text.to_string(),
            threshold: self.config.threshold,
            classification,
        })
    }

    async fn baseline(&self, hotel: &Hotel) -> Result<(String, EmbeddingVector), AnalysisError> {
        let text = parameter_text(hotel);
        match self.resolve(&text).await {
            Ok(embedding) => Ok((text, embedding)),
            Err(e) => {
                tracing::error!(
                    hotel_id = %hotel.id,
                    error = %e,
                    "hotel parameter embedding unavailable"
                );
                Err(AnalysisError::AnalysisUnavailable {
                    hotel_id: hotel.id.clone(),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Cached embedding lookup; misses go to the provider with retries.
    async fn resolve(&self, text: &str) -> Result<EmbeddingVector, AnalysisError> {
        let provider = &self.provider;
        let AnalyzerConfig {
            max_retries,
            retry_backoff_ms,
            ..
        } = self.config;

        self.cache
            .get_or_compute(text, |text| async move {
                retry_with_backoff(max_retries, retry_backoff_ms, || provider.embed(&text)).await
            })
            .await
    }

    fn score(
        &self,
        baseline: &EmbeddingVector,
        review: &EmbeddingVector,
    ) -> Result<Classification, AnalysisError> {
        let similarity =
            cosine_similarity(baseline.as_slice(), review.as_slice()).inspect_err(|e| {
                tracing::error!(error = %e, "embeddings cannot be compared");
            })?;
        Ok(classify(similarity, self.config.threshold))
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
