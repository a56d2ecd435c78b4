//! Deployment configuration, read once from the environment at startup.
//!
//! Every override is best effort: a value that does not parse (or is out of
//! range) is ignored with a warning and the default stays in place.

use std::path::PathBuf;

use crate::adapters::anthropic::{AnthropicConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::domain::{DefaultAssessment, RiskBands, DEFAULT_ASSESSMENT, STANDARD_BANDS, THREE_BANDS};

/// Default directory holding `model.json` / `scaler.json` / `manifest.json`.
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Settings for the whole pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub model_dir: PathBuf,
    pub require_model_manifest: bool,
    /// `None` when no API key is configured.
    pub reasoning: Option<AnthropicConfig>,
    pub skip_reasoning_probe: bool,
    pub risk_bands: RiskBands,
    pub default_assessment: DefaultAssessment,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            require_model_manifest: false,
            reasoning: None,
            skip_reasoning_probe: false,
            risk_bands: STANDARD_BANDS,
            default_assessment: DEFAULT_ASSESSMENT,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a band set name.
#[must_use]
pub fn parse_risk_bands(raw: &str) -> Option<RiskBands> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "standard" | "four" | "4" => Some(STANDARD_BANDS),
        "three" | "3" => Some(THREE_BANDS),
        _ => None,
    }
}

impl PipelineConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_nonempty("CARDIORISK_MODEL_DIR") {
            cfg.model_dir = PathBuf::from(v);
        }
        cfg.require_model_manifest = env_flag("CARDIORISK_REQUIRE_MODEL_MANIFEST");
        cfg.skip_reasoning_probe = env_flag("CARDIORISK_SKIP_LLM_PROBE");

        if let Some(v) = env_nonempty("CARDIORISK_RISK_BANDS") {
            match parse_risk_bands(&v) {
                Some(bands) => cfg.risk_bands = bands,
                None => tracing::warn!("Ignoring unknown CARDIORISK_RISK_BANDS value {v:?}"),
            }
        }

        if let Some(v) = env_nonempty("CARDIORISK_DEFAULT_RISK_PERCENTAGE") {
            match v.parse::<f64>() {
                Ok(x) if x.is_finite() && (0.0..=100.0).contains(&x) => {
                    // An overridden default is banded like any other estimate.
                    cfg.default_assessment = DefaultAssessment {
                        risk_percentage: x,
                        risk_level: cfg.risk_bands.stratify(x),
                    };
                }
                _ => tracing::warn!("Ignoring invalid CARDIORISK_DEFAULT_RISK_PERCENTAGE value {v:?}"),
            }
        }

        let api_key = env_nonempty("ANTHROPIC_API_KEY").or_else(|| env_nonempty("CLAUDE_API_KEY"));
        cfg.reasoning = api_key.map(|key| {
            let mut reasoning = AnthropicConfig::new(key);
            reasoning.base_url =
                env_nonempty("CARDIORISK_LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            reasoning.model =
                env_nonempty("CARDIORISK_LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
            reasoning.timeout_secs = match env_nonempty("CARDIORISK_LLM_TIMEOUT_SECS") {
                Some(v) => match v.parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        tracing::warn!("Ignoring invalid CARDIORISK_LLM_TIMEOUT_SECS value {v:?}");
                        DEFAULT_TIMEOUT_SECS
                    }
                },
                None => DEFAULT_TIMEOUT_SECS,
            };
            reasoning
        });

        if cfg.reasoning.is_none() {
            tracing::info!("No reasoning provider API key configured");
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskLevel;

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.model_dir, PathBuf::from("models"));
        assert!(cfg.reasoning.is_none());
        assert_eq!(cfg.risk_bands, STANDARD_BANDS);
        assert_eq!(cfg.default_assessment.risk_percentage, 25.0);
        assert_eq!(cfg.default_assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_parse_risk_bands() {
        assert_eq!(parse_risk_bands("Three"), Some(THREE_BANDS));
        assert_eq!(parse_risk_bands(" standard "), Some(STANDARD_BANDS));
        assert_eq!(parse_risk_bands("five"), None);
    }
}
