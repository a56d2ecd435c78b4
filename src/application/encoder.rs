//! Feature encoder: profile to model-ready vector.

use std::sync::Arc;

use crate::domain::features::{self, ENCODED_FEATURES};
use crate::domain::{FeatureVector, HealthProfile, FEATURE_LAYOUT_VERSION, FEATURE_WIDTH};
use crate::ports::FeatureNormalizer;

/// Encodes profiles and applies the optional normalizer.
#[derive(Clone, Default)]
pub struct FeatureEncoder {
    normalizer: Option<Arc<dyn FeatureNormalizer>>,
}

impl FeatureEncoder {
    #[must_use]
    pub fn new(normalizer: Option<Arc<dyn FeatureNormalizer>>) -> Self {
        Self { normalizer }
    }

    #[must_use]
    pub fn has_normalizer(&self) -> bool {
        self.normalizer.is_some()
    }

    #[must_use]
    pub fn layout_version(&self) -> u32 {
        FEATURE_LAYOUT_VERSION
    }

    #[must_use]
    pub fn width(&self) -> usize {
        FEATURE_WIDTH
    }

    /// Names of the populated positions, in position order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<&'static str> {
        ENCODED_FEATURES.iter().map(|(name, _)| *name).collect()
    }

    /// Encode and normalize. Never fails: a normalizer error is logged and
    /// the unnormalized vector is returned instead.
    #[must_use]
    pub fn encode(&self, profile: &HealthProfile) -> FeatureVector {
        let raw = features::encode(profile);

        let Some(normalizer) = &self.normalizer else {
            return raw;
        };

        match normalizer.transform(raw.as_slice()) {
            Ok(scaled) if scaled.len() == raw.len() => FeatureVector::from_raw(scaled),
            Ok(scaled) => {
                tracing::warn!(
                    "Normalizer changed vector width ({} -> {}), using unnormalized features",
                    raw.len(),
                    scaled.len()
                );
                raw
            }
            Err(e) => {
                tracing::warn!("Normalization failed, using unnormalized features: {e}");
                raw
            }
        }
    }
}

impl std::fmt::Debug for FeatureEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureEncoder")
            .field("layout_version", &FEATURE_LAYOUT_VERSION)
            .field("normalizer", &self.normalizer.is_some())
            .finish()
    }
}
