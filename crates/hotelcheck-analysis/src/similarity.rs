//! Cosine similarity between embeddings.

use crate::error::AnalysisError;

/// Cosine similarity of `a` and `b`: their dot product divided by the product
/// of their magnitudes.
///
/// Sums are accumulated in `f64`; the result is clamped to `[-1.0, 1.0]` to
/// absorb rounding on near-parallel vectors.
///
/// # Errors
///
/// - [`AnalysisError::DimensionMismatch`] if the lengths differ.
/// - [`AnalysisError::DegenerateVector`] if either vector has zero magnitude
///   (this includes empty vectors).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, AnalysisError> {
    if a.len() != b.len() {
        return Err(AnalysisError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Err(AnalysisError::DegenerateVector);
    }

    #[allow(clippy::cast_possible_truncation)]
    let similarity = (dot / denom).clamp(-1.0, 1.0) as f32;
    Ok(similarity)
}
