//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. The feature layout,
//! risk bands and rule tables are all fixed, versioned constants.

mod assessment;
pub mod features;
mod profile;
pub mod rules;

pub use assessment::{
    round2, stratify, DefaultAssessment, Impact, RiskAssessment, RiskBands, RiskEstimate,
    RiskFactor, RiskLevel, DEFAULT_ASSESSMENT, STANDARD_BANDS, THREE_BANDS,
};
pub use features::{FeatureVector, FEATURE_LAYOUT_VERSION, FEATURE_WIDTH};
pub use profile::{GeneralHealth, HealthProfile, HealthProfileBuilder, ProfileError, Sex, YesNo};
