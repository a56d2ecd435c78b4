//! # Cardiorisk
//!
//! Cardiovascular risk scoring with graceful degradation.
//!
//! This crate provides:
//! - A fixed-width feature encoder for a pre-trained risk classifier
//! - A tiered inference engine: primary model, remote reasoning provider,
//!   static default; the first well-formed answer wins
//! - Rule-based risk factors and recommendations
//! - Diet/exercise plans and a heart-health chat with the same fallback shape
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (Health profile, feature layout, risk bands, rules)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (logistic model, Anthropic API, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven deployment settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::Pipeline;
pub use domain::{HealthProfile, RiskAssessment, RiskLevel};

/// Result type for Cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for Cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid health profile: {0}")]
    Profile(#[from] domain::ProfileError),

    #[error("Static default tier '{tier}' failed: {reason}")]
    DefaultTier { tier: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CardioriskError {
    /// Whether the caller sent something malformed (as opposed to a server
    /// side defect).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Profile(_) | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_and_server_errors_are_split() {
        assert!(CardioriskError::Validation("bad".into()).is_client_error());
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(CardioriskError::from(parse).is_client_error());

        let default = CardioriskError::DefaultTier {
            tier: "static-default".into(),
            reason: "empty text".into(),
        };
        assert!(!default.is_client_error());
    }
}
