//! Normalizer port: Optional feature scaling before inference.

/// Errors raised while normalizing a feature vector.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NormalizationError {
    #[error("Normalizer expects {expected} features, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Normalization produced a non-finite value at position {0}")]
    NonFinite(usize),
}

/// Vector-to-vector transform applied after encoding.
///
/// Normalization is an optimization: callers treat a failure as a no-op and
/// proceed with the unnormalized vector.
pub trait FeatureNormalizer: Send + Sync {
    /// Transform a vector.
    ///
    /// # Errors
    /// Returns `NormalizationError` if the vector cannot be transformed.
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, NormalizationError>;
}
