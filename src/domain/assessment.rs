//! Risk assessment types and risk-band stratification.

use serde::{Deserialize, Serialize};

/// Risk band for cardiovascular disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "Medium-High Risk")]
    MediumHigh,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    /// Label used in response documents.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::MediumHigh => "Medium-High Risk",
            Self::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered, non-overlapping cut points over [0, 100).
///
/// Each `(cutoff, level)` pair covers `[previous_cutoff, cutoff)`; anything at
/// or above the last cutoff is `top`. A value equal to a cutoff therefore
/// falls in the higher band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskBands {
    cuts: &'static [(f64, RiskLevel)],
    top: RiskLevel,
}

/// Four bands: <20 Low, <40 Moderate, <60 Medium-High, otherwise High.
pub const STANDARD_BANDS: RiskBands = RiskBands {
    cuts: &[
        (20.0, RiskLevel::Low),
        (40.0, RiskLevel::Moderate),
        (60.0, RiskLevel::MediumHigh),
    ],
    top: RiskLevel::High,
};

/// Three bands: <30 Low, <70 Moderate, otherwise High.
pub const THREE_BANDS: RiskBands = RiskBands {
    cuts: &[(30.0, RiskLevel::Low), (70.0, RiskLevel::Moderate)],
    top: RiskLevel::High,
};

impl Default for RiskBands {
    fn default() -> Self {
        STANDARD_BANDS
    }
}

impl RiskBands {
    /// Map a percentage to its band. Values below 0 land in the first band,
    /// values at or above 100 (and NaN) in the top band.
    #[must_use]
    pub fn stratify(&self, risk_percentage: f64) -> RiskLevel {
        self.cuts
            .iter()
            .find(|(cutoff, _)| risk_percentage < *cutoff)
            .map_or(self.top, |(_, level)| *level)
    }

    /// Cut points in ascending order.
    #[must_use]
    pub fn cutoffs(&self) -> Vec<f64> {
        self.cuts.iter().map(|(c, _)| *c).collect()
    }

    /// All levels this configuration can produce, lowest first.
    #[must_use]
    pub fn levels(&self) -> Vec<RiskLevel> {
        self.cuts
            .iter()
            .map(|(_, l)| *l)
            .chain(std::iter::once(self.top))
            .collect()
    }
}

/// Stratify with the standard four-band configuration.
#[must_use]
pub fn stratify(risk_percentage: f64) -> RiskLevel {
    STANDARD_BANDS.stratify(risk_percentage)
}

/// Round to two decimals for response documents.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Output of a risk-scoring tier, before explanation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskEstimate {
    /// Risk on a 0-100 scale.
    pub risk_percentage: f64,

    /// Band fixed by the tier itself. Only the static default sets this;
    /// every other tier leaves banding to the stratifier.
    pub band: Option<RiskLevel>,
}

impl RiskEstimate {
    /// From a model probability in [0, 1].
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self {
            risk_percentage: probability * 100.0,
            band: None,
        }
    }

    /// From a percentage in [0, 100].
    #[must_use]
    pub fn from_percentage(risk_percentage: f64) -> Self {
        Self {
            risk_percentage,
            band: None,
        }
    }

    /// A percentage with a pre-assigned band.
    #[must_use]
    pub fn banded(risk_percentage: f64, band: RiskLevel) -> Self {
        Self {
            risk_percentage,
            band: Some(band),
        }
    }

    /// Whether the percentage is finite and within [0, 100].
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.risk_percentage.is_finite() && (0.0..=100.0).contains(&self.risk_percentage)
    }

    /// Resolve the band, using the pre-assigned one when present.
    #[must_use]
    pub fn risk_level(&self, bands: &RiskBands) -> RiskLevel {
        self.band
            .unwrap_or_else(|| bands.stratify(self.risk_percentage))
    }
}

/// Configured answer of the static default tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultAssessment {
    pub risk_percentage: f64,
    pub risk_level: RiskLevel,
}

/// 25% / Low Risk regardless of the profile. This is a known limitation:
/// the default tier does not look at severity.
pub const DEFAULT_ASSESSMENT: DefaultAssessment = DefaultAssessment {
    risk_percentage: 25.0,
    risk_level: RiskLevel::Low,
};

impl Default for DefaultAssessment {
    fn default() -> Self {
        DEFAULT_ASSESSMENT
    }
}

/// Impact of a single risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// A named contributor to the risk score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub impact: Impact,
}

impl RiskFactor {
    #[must_use]
    pub fn new(factor: impl Into<String>, impact: Impact) -> Self {
        Self {
            factor: factor.into(),
            impact,
        }
    }
}

/// Explained risk assessment returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100, two decimals
    pub risk_percentage: f64,
    pub risk_level: RiskLevel,
    /// At most three, in rule order
    pub top_risk_factors: Vec<RiskFactor>,
    /// At most five, in rule order
    pub recommendations: Vec<String>,
}
