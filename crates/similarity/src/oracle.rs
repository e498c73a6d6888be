use async_trait::async_trait;

use crate::SimilarityError;

/// External semantic text-similarity capability.
///
/// Implementations may be remote and fallible. Callers short-circuit identical
/// labels to `1.0`, so an oracle is only asked about distinct strings.
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    /// Short name used in logs and breaker errors.
    fn name(&self) -> &str;

    /// Similarity of `a` and `b` in `[0, 1]`.
    async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError>;
}

/// Clamp an oracle score into `[0, 1]`. Non-finite scores are failures.
pub fn normalize_score(value: f64) -> Result<f64, SimilarityError> {
    if !value.is_finite() {
        return Err(SimilarityError::InvalidResponse(format!(
            "similarity must be finite, got {value}"
        )));
    }
    Ok(value.clamp(0.0, 1.0))
}
