//! Risk model port: Trait for the primary predictive model.
//!
//! This trait abstracts the trained classifier from the application logic.

/// Errors raised by a risk model implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not loaded: {0}")]
    NotLoaded(String),

    #[error("Input width mismatch: model expects {expected} features, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Model produced an invalid probability: {0}")]
    InvalidOutput(f64),

    #[error("Model artifact invalid: {0}")]
    Artifact(String),
}

/// A pre-trained binary classifier.
///
/// Implementations are loaded once at startup and shared read-only across
/// requests, so they must be `Send + Sync`.
pub trait RiskModel: Send + Sync {
    /// Number of features the model expects.
    fn input_width(&self) -> usize;

    /// Probability of the positive class, in [0, 1].
    ///
    /// # Errors
    /// Returns `ModelError::WidthMismatch` if `features` has the wrong length.
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError>;
}
