//! Tiered inference engine: ordered fallback over interchangeable providers.
//!
//! A request is offered to each available tier in order. The first tier that
//! returns a well-formed output wins. Errors and malformed outputs are tier
//! failures: logged, never propagated. The last tier is a static default that
//! does no I/O; if it fails, that is a defect and is surfaced as
//! `CardioriskError::DefaultTier`.

use crate::domain::RiskEstimate;
use crate::CardioriskError;

/// Why a tier did not produce a result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TierFailure {
    #[error("tier unavailable")]
    Unavailable,

    #[error("provider error: {0}")]
    Provider(String),

    #[error("malformed output: {0}")]
    MalformedOutput(String),
}

/// Shape check applied to every tier output before it is accepted.
pub trait TierOutput {
    /// # Errors
    /// Returns `TierFailure::MalformedOutput` if the value violates the
    /// declared output shape.
    fn check(&self) -> Result<(), TierFailure>;
}

impl TierOutput for RiskEstimate {
    fn check(&self) -> Result<(), TierFailure> {
        if self.is_well_formed() {
            Ok(())
        } else {
            Err(TierFailure::MalformedOutput(format!(
                "risk percentage {} outside [0, 100]",
                self.risk_percentage
            )))
        }
    }
}

impl TierOutput for String {
    fn check(&self) -> Result<(), TierFailure> {
        if self.trim().is_empty() {
            Err(TierFailure::MalformedOutput("empty text".into()))
        } else {
            Ok(())
        }
    }
}

/// One fallback stage.
pub trait Tier<I, O>: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Availability, computed once when the tier is constructed.
    fn is_available(&self) -> bool {
        true
    }

    /// Single attempt, no retries.
    ///
    /// # Errors
    /// Returns `TierFailure` on any provider error or unusable output.
    fn attempt(&self, input: &I) -> Result<O, TierFailure>;
}

/// Output together with the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<O> {
    pub value: O,
    pub tier: String,
}

/// Ordered tiers plus an infallible static default.
pub struct TieredEngine<I, O> {
    tiers: Vec<Box<dyn Tier<I, O>>>,
    default: Box<dyn Tier<I, O>>,
}

impl<I, O> TieredEngine<I, O>
where
    O: TierOutput,
{
    /// Create an engine that only has the static default.
    #[must_use]
    pub fn new(default: Box<dyn Tier<I, O>>) -> Self {
        Self {
            tiers: Vec::new(),
            default,
        }
    }

    /// Append a tier ahead of the default. Tiers run in insertion order.
    #[must_use]
    pub fn with_tier(mut self, tier: Box<dyn Tier<I, O>>) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Names of all tiers in order, the default last.
    #[must_use]
    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers
            .iter()
            .map(|t| t.name())
            .chain(std::iter::once(self.default.name()))
            .collect()
    }

    /// Names of tiers that will be attempted, the default last.
    #[must_use]
    pub fn available_tiers(&self) -> Vec<&str> {
        self.tiers
            .iter()
            .filter(|t| t.is_available())
            .map(|t| t.name())
            .chain(std::iter::once(self.default.name()))
            .collect()
    }

    fn try_tier(tier: &dyn Tier<I, O>, input: &I) -> Result<O, TierFailure> {
        let value = tier.attempt(input)?;
        value.check()?;
        Ok(value)
    }

    /// Run the chain. Exactly one tier wins.
    ///
    /// # Errors
    /// Returns `CardioriskError::DefaultTier` only if the static default
    /// itself fails, which indicates a build or configuration defect.
    pub fn run(&self, input: &I) -> Result<Resolved<O>, CardioriskError> {
        for tier in self.tiers.iter().filter(|t| t.is_available()) {
            match Self::try_tier(tier.as_ref(), input) {
                Ok(value) => {
                    tracing::debug!(tier = tier.name(), "Tier answered");
                    return Ok(Resolved {
                        value,
                        tier: tier.name().to_string(),
                    });
                }
                Err(failure) => {
                    tracing::warn!(tier = tier.name(), "Tier failed, falling back: {failure}");
                }
            }
        }

        match Self::try_tier(self.default.as_ref(), input) {
            Ok(value) => {
                tracing::debug!(tier = self.default.name(), "Static default answered");
                Ok(Resolved {
                    value,
                    tier: self.default.name().to_string(),
                })
            }
            Err(failure) => {
                tracing::error!(tier = self.default.name(), "Static default failed: {failure}");
                Err(CardioriskError::DefaultTier {
                    tier: self.default.name().to_string(),
                    reason: failure.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedTier {
        name: &'static str,
        available: bool,
        result: Result<String, TierFailure>,
        calls: Arc<AtomicUsize>,
    }

    impl FixedTier {
        fn ok(name: &'static str, text: &str) -> Self {
            Self {
                name,
                available: true,
                result: Ok(text.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                available: true,
                result: Err(TierFailure::Provider("boom".into())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }
    }

    impl Tier<(), String> for FixedTier {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn attempt(&self, _input: &()) -> Result<String, TierFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[test]
    fn test_first_available_tier_wins() {
        let engine =
            TieredEngine::<(), String>::new(Box::new(FixedTier::ok("default", "static")))
                .with_tier(Box::new(FixedTier::ok("primary", "from primary")))
                .with_tier(Box::new(FixedTier::ok("secondary", "from secondary")));

        let out = engine.run(&()).expect("run");
        assert_eq!(out.tier, "primary");
        assert_eq!(out.value, "from primary");
    }

    #[test]
    fn test_failure_falls_through_in_order() {
        let engine =
            TieredEngine::<(), String>::new(Box::new(FixedTier::ok("default", "static")))
                .with_tier(Box::new(FixedTier::failing("primary")))
                .with_tier(Box::new(FixedTier::ok("secondary", "from secondary")));

        let out = engine.run(&()).expect("run");
        assert_eq!(out.tier, "secondary");
    }

    #[test]
    fn test_unavailable_tier_is_never_attempted() {
        let primary = FixedTier::ok("primary", "x").unavailable();
        let calls = Arc::clone(&primary.calls);
        let engine =
            TieredEngine::<(), String>::new(Box::new(FixedTier::ok("default", "static")))
                .with_tier(Box::new(primary));

        let out = engine.run(&()).expect("run");
        assert_eq!(out.tier, "default");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.available_tiers(), vec!["default"]);
        assert_eq!(engine.tier_names(), vec!["primary", "default"]);
    }

    #[test]
    fn test_single_attempt_per_tier() {
        let primary = FixedTier::failing("primary");
        let calls = Arc::clone(&primary.calls);
        let engine =
            TieredEngine::<(), String>::new(Box::new(FixedTier::ok("default", "static")))
                .with_tier(Box::new(primary));

        engine.run(&()).expect("run");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shape_violation_counts_as_failure() {
        let engine =
            TieredEngine::<(), String>::new(Box::new(FixedTier::ok("default", "static")))
                .with_tier(Box::new(FixedTier::ok("primary", "   ")));

        let out = engine.run(&()).expect("run");
        assert_eq!(out.tier, "default");
        assert_eq!(out.value, "static");
    }

    #[test]
    fn test_default_failure_is_loud() {
        let engine =
            TieredEngine::<(), String>::new(Box::new(FixedTier::ok("default", "")));
        let err = engine.run(&()).unwrap_err();
        assert!(matches!(err, CardioriskError::DefaultTier { .. }));
    }

    #[test]
    fn test_risk_estimate_shape_check() {
        assert!(RiskEstimate::from_percentage(50.0).check().is_ok());
        assert!(RiskEstimate::from_percentage(f64::INFINITY).check().is_err());
        assert!(RiskEstimate::from_probability(1.5).check().is_err());
    }
}
