//! Threshold classifier turning a similarity into a verification verdict.

use crate::types::Classification;

/// Default similarity threshold below which a review needs a secret guest.
pub const DEFAULT_THRESHOLD: f32 = 0.75;

/// Classify a cosine similarity against `threshold`.
///
/// A review requires verification only when its similarity is strictly below
/// the threshold; a score equal to the threshold is consistent. The display
/// percentage is clamped to `[0, 100]`, so negative similarities show as `0`.
#[must_use]
pub fn classify(similarity: f32, threshold: f32) -> Classification {
    Classification {
        similarity,
        score_percent: (similarity * 100.0).clamp(0.0, 100.0),
        requires_verification: similarity < threshold,
    }
}
