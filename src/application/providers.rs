//! Provider handles, constructed once at process start.
//!
//! Availability is decided here and never re-checked: a missing model
//! artifact, a missing API key or a failed startup probe each leave the
//! corresponding handle empty, and the tiers built on it report themselves
//! unavailable for the life of the process.

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::anthropic::AnthropicClient;
use crate::adapters::logistic::load_artifacts;
use crate::config::PipelineConfig;
use crate::ports::{FeatureNormalizer, RiskModel, TextCompletion};

/// Shared, read-only provider handles.
#[derive(Clone, Default)]
pub struct Providers {
    pub model: Option<Arc<dyn RiskModel>>,
    pub normalizer: Option<Arc<dyn FeatureNormalizer>>,
    pub completion: Option<Arc<dyn TextCompletion>>,
}

/// Availability summary for the status command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub status: &'static str,
    pub model_loaded: bool,
    pub normalizer_loaded: bool,
    pub reasoning_available: bool,
}

impl Providers {
    /// No providers: every request resolves at the static default.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Load the model artifacts and connect the reasoning provider.
    ///
    /// Never fails: every problem is logged and leaves that handle empty.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut providers = Self::none();

        match load_artifacts(&config.model_dir, config.require_model_manifest) {
            Ok(artifacts) => {
                providers.model = Some(Arc::new(artifacts.model));
                providers.normalizer = artifacts
                    .scaler
                    .map(|s| Arc::new(s) as Arc<dyn FeatureNormalizer>);
            }
            Err(e) => {
                tracing::warn!("Risk model unavailable: {e}");
            }
        }

        if let Some(reasoning) = &config.reasoning {
            match AnthropicClient::new(reasoning.clone()) {
                Ok(client) => {
                    let usable = if config.skip_reasoning_probe {
                        tracing::info!("Skipping reasoning provider probe");
                        true
                    } else {
                        match client.probe() {
                            Ok(()) => {
                                tracing::info!(model = client.model(), "Reasoning provider reachable");
                                true
                            }
                            Err(e) => {
                                tracing::warn!("Reasoning provider probe failed: {e}");
                                false
                            }
                        }
                    };
                    if usable {
                        providers.completion = Some(Arc::new(client));
                    }
                }
                Err(e) => {
                    tracing::warn!("Reasoning provider unavailable: {e}");
                }
            }
        }

        providers
    }

    /// Set the primary model.
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn RiskModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the feature normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<dyn FeatureNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Set the reasoning provider.
    #[must_use]
    pub fn with_completion(mut self, completion: Arc<dyn TextCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    #[must_use]
    pub fn status(&self) -> ProviderStatus {
        ProviderStatus {
            status: "healthy",
            model_loaded: self.model.is_some(),
            normalizer_loaded: self.normalizer.is_some(),
            reasoning_available: self.completion.is_some(),
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("model", &self.model.is_some())
            .field("normalizer", &self.normalizer.is_some())
            .field("completion", &self.completion.is_some())
            .finish()
    }
}
