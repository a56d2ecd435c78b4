//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (trained model, feature
//! scaler, remote reasoning service).

mod completion;
mod normalizer;
mod risk_model;

pub use completion::{CompletionError, CompletionOptions, TextCompletion};
pub use normalizer::{FeatureNormalizer, NormalizationError};
pub use risk_model::{ModelError, RiskModel};
