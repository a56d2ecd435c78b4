//! Risk assessment service: tiered scoring followed by rule-based explanation.
//!
//! Tier order is fixed: primary model, reasoning provider, static default.
//! Whichever tier answers, the band comes from the configured stratifier and
//! the factors/recommendations come from the rule tables, so the explanation
//! never depends on which provider happened to be up.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::encoder::FeatureEncoder;
use super::providers::Providers;
use super::tiered::{Resolved, Tier, TierFailure, TieredEngine};
use crate::domain::{
    round2, rules, DefaultAssessment, HealthProfile, RiskAssessment, RiskBands, RiskEstimate,
};
use crate::ports::{CompletionOptions, RiskModel, TextCompletion};

const REASONING_MAX_TOKENS: u32 = 500;

static JSON_OBJECT: OnceLock<Regex> = OnceLock::new();

fn json_object() -> &'static Regex {
    // Greedy: from the first '{' to the last '}' in the reply.
    JSON_OBJECT.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("Valid regex"))
}

/// Tier 1: the pre-trained classifier.
pub struct ModelTier {
    model: Option<Arc<dyn RiskModel>>,
    encoder: FeatureEncoder,
}

impl ModelTier {
    #[must_use]
    pub fn new(model: Option<Arc<dyn RiskModel>>, encoder: FeatureEncoder) -> Self {
        Self { model, encoder }
    }
}

impl Tier<HealthProfile, RiskEstimate> for ModelTier {
    fn name(&self) -> &str {
        "model"
    }

    fn is_available(&self) -> bool {
        self.model.is_some()
    }

    fn attempt(&self, profile: &HealthProfile) -> Result<RiskEstimate, TierFailure> {
        let model = self.model.as_ref().ok_or(TierFailure::Unavailable)?;
        let features = self.encoder.encode(profile);
        let probability = model
            .predict_probability(features.as_slice())
            .map_err(|e| TierFailure::Provider(e.to_string()))?;
        Ok(RiskEstimate::from_probability(probability))
    }
}

/// Build the scoring prompt for the reasoning provider.
#[must_use]
pub fn risk_prompt(profile: &HealthProfile) -> String {
    format!(
        "Analyze this health profile and return ONLY valid JSON:\n\n\
         Age: {} years\n\
         Gender: {}\n\
         BMI: {}\n\
         Smoking: {}\n\
         Physical Activity: {}\n\
         Alcohol: {}\n\
         General Health: {}\n\
         Sleep: {} hours\n\
         Diabetes: {}\n\n\
         Return JSON with risk_percentage, risk_level, top_risk_factors, recommendations",
        profile.age(),
        profile.field_text("sex", profile.sex()),
        profile.bmi_display(),
        profile.field_text("smoking", profile.smoking()),
        profile.field_text("physical_activity", profile.physical_activity()),
        profile.field_text("alcohol", profile.alcohol()),
        profile.field_text("general_health", profile.general_health()),
        profile.sleep_hours(),
        profile.field_text("diabetes", profile.diabetes()),
    )
}

/// Pull `risk_percentage` out of a free-text reply.
///
/// Only the percentage is taken; any band label, factors or advice in the
/// reply are ignored.
///
/// # Errors
/// Returns `TierFailure::MalformedOutput` if the reply has no JSON object or
/// the object has no numeric `risk_percentage`.
pub fn parse_risk_reply(reply: &str) -> Result<RiskEstimate, TierFailure> {
    let payload = json_object()
        .find(reply)
        .ok_or_else(|| TierFailure::MalformedOutput("no JSON object in reply".into()))?;

    let value: serde_json::Value = serde_json::from_str(payload.as_str())
        .map_err(|e| TierFailure::MalformedOutput(format!("invalid JSON in reply: {e}")))?;

    let pct = match value.get("risk_percentage") {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| TierFailure::MalformedOutput("reply has no numeric risk_percentage".into()))?;

    Ok(RiskEstimate::from_percentage(pct))
}

/// Tier 2: the remote reasoning provider asked for a JSON estimate.
pub struct ReasoningRiskTier {
    completion: Option<Arc<dyn TextCompletion>>,
}

impl ReasoningRiskTier {
    #[must_use]
    pub fn new(completion: Option<Arc<dyn TextCompletion>>) -> Self {
        Self { completion }
    }
}

impl Tier<HealthProfile, RiskEstimate> for ReasoningRiskTier {
    fn name(&self) -> &str {
        "reasoning"
    }

    fn is_available(&self) -> bool {
        self.completion.is_some()
    }

    fn attempt(&self, profile: &HealthProfile) -> Result<RiskEstimate, TierFailure> {
        let completion = self.completion.as_ref().ok_or(TierFailure::Unavailable)?;
        let reply = completion
            .complete(
                &risk_prompt(profile),
                &CompletionOptions::with_max_tokens(REASONING_MAX_TOKENS),
            )
            .map_err(|e| TierFailure::Provider(e.to_string()))?;
        parse_risk_reply(&reply)
    }
}

/// Tier 3: fixed answer, no I/O.
pub struct StaticDefaultTier {
    default: DefaultAssessment,
}

impl StaticDefaultTier {
    #[must_use]
    pub fn new(default: DefaultAssessment) -> Self {
        Self { default }
    }
}

impl Tier<HealthProfile, RiskEstimate> for StaticDefaultTier {
    fn name(&self) -> &str {
        "static-default"
    }

    fn attempt(&self, _profile: &HealthProfile) -> Result<RiskEstimate, TierFailure> {
        Ok(RiskEstimate::banded(
            self.default.risk_percentage,
            self.default.risk_level,
        ))
    }
}

/// Scores and explains health profiles.
pub struct AssessmentService {
    engine: TieredEngine<HealthProfile, RiskEstimate>,
    bands: RiskBands,
}

impl AssessmentService {
    /// Wire the three tiers from the shared provider handles.
    #[must_use]
    pub fn new(providers: &Providers, bands: RiskBands, default: DefaultAssessment) -> Self {
        let encoder = FeatureEncoder::new(providers.normalizer.clone());
        let engine =
            TieredEngine::<HealthProfile, RiskEstimate>::new(Box::new(StaticDefaultTier::new(default)))
                .with_tier(Box::new(ModelTier::new(providers.model.clone(), encoder)))
                .with_tier(Box::new(ReasoningRiskTier::new(providers.completion.clone())));

        tracing::debug!(tiers = ?engine.available_tiers(), "Risk assessment tiers ready");
        Self { engine, bands }
    }

    #[must_use]
    pub fn bands(&self) -> RiskBands {
        self.bands
    }

    /// Tiers that will be attempted, in order.
    #[must_use]
    pub fn available_tiers(&self) -> Vec<&str> {
        self.engine.available_tiers()
    }

    /// Assess a profile and report which tier scored it.
    ///
    /// # Errors
    /// Returns `CardioriskError::DefaultTier` if even the static default
    /// produced an unusable estimate.
    pub fn assess_resolved(
        &self,
        profile: &HealthProfile,
    ) -> crate::Result<Resolved<RiskAssessment>> {
        let Resolved { value: estimate, tier } = self.engine.run(profile)?;
        let risk_level = estimate.risk_level(&self.bands);

        tracing::info!(
            tier = %tier,
            "Risk assessed: {:.2}% ({})",
            estimate.risk_percentage,
            risk_level
        );

        Ok(Resolved {
            value: RiskAssessment {
                risk_percentage: round2(estimate.risk_percentage),
                risk_level,
                top_risk_factors: rules::top_risk_factors(profile),
                recommendations: rules::recommendations(profile),
            },
            tier,
        })
    }

    /// Assess a profile.
    ///
    /// # Errors
    /// See [`AssessmentService::assess_resolved`].
    pub fn assess(&self, profile: &HealthProfile) -> crate::Result<RiskAssessment> {
        self.assess_resolved(profile).map(|r| r.value)
    }
}
