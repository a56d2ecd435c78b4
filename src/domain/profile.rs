//! Health profile types for cardiovascular risk estimation.
//!
//! A `HealthProfile` is built once per request from raw key-value input.
//! Missing keys take documented defaults; values of the wrong type are
//! rejected. Once built, the profile is immutable.

use serde_json::{Map, Value};

/// Default age in years when the key is absent.
pub const DEFAULT_AGE: u32 = 50;
/// Default body-mass index when the key is absent.
pub const DEFAULT_BMI: f64 = 25.0;
/// Default nightly sleep duration in hours when the key is absent.
pub const DEFAULT_SLEEP_HOURS: u32 = 7;

/// Errors raised while building a profile from raw input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("Health profile must be a JSON object")]
    NotAnObject,

    #[error("Field '{field}' has the wrong type: expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field '{field}' out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Biological sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unspecified,
}

impl Sex {
    /// Parse case-insensitively; anything other than male/female is unspecified.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Unspecified,
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
            Self::Unspecified => write!(f, "Unspecified"),
        }
    }
}

/// Normalized yes/no status.
///
/// Input that is neither "yes" nor "no" is kept as `Unrecognized`: it
/// encodes as 0 and triggers neither a concerning nor an affirming rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
    Unrecognized,
}

impl YesNo {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Self::Yes,
            "no" => Self::No,
            _ => Self::Unrecognized,
        }
    }

    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }

    #[must_use]
    pub fn is_no(self) -> bool {
        self == Self::No
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
            Self::Unrecognized => write!(f, "Unknown"),
        }
    }
}

/// Self-reported general health, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GeneralHealth {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
    /// Not one of the five categories. Sorts after `Excellent` but carries
    /// no ordinal meaning; rules ignore it.
    Unrecognized,
}

impl GeneralHealth {
    /// Parse case-insensitively, tolerating `very_good` / `very-good` / `verygood`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match folded.as_str() {
            "poor" => Self::Poor,
            "fair" => Self::Fair,
            "good" => Self::Good,
            "verygood" => Self::VeryGood,
            "excellent" => Self::Excellent,
            _ => Self::Unrecognized,
        }
    }

    /// Poor or Fair.
    #[must_use]
    pub fn is_concerning(self) -> bool {
        matches!(self, Self::Poor | Self::Fair)
    }

    /// Good, Very Good or Excellent.
    #[must_use]
    pub fn is_affirming(self) -> bool {
        matches!(self, Self::Good | Self::VeryGood | Self::Excellent)
    }
}

impl std::fmt::Display for GeneralHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poor => write!(f, "Poor"),
            Self::Fair => write!(f, "Fair"),
            Self::Good => write!(f, "Good"),
            Self::VeryGood => write!(f, "Very Good"),
            Self::Excellent => write!(f, "Excellent"),
            Self::Unrecognized => write!(f, "Unknown"),
        }
    }
}

/// Validated, immutable health profile.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthProfile {
    age: u32,
    sex: Sex,
    bmi: f64,
    smoking: YesNo,
    physical_activity: YesNo,
    alcohol: YesNo,
    general_health: GeneralHealth,
    sleep_hours: u32,
    diabetes: YesNo,
    /// Input text of categorical fields that did not parse, by field name.
    unrecognized: Vec<(&'static str, String)>,
}

impl Default for HealthProfile {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            sex: Sex::Male,
            bmi: DEFAULT_BMI,
            smoking: YesNo::No,
            physical_activity: YesNo::Yes,
            alcohol: YesNo::No,
            general_health: GeneralHealth::Good,
            sleep_hours: DEFAULT_SLEEP_HOURS,
            diabetes: YesNo::No,
            unrecognized: Vec::new(),
        }
    }
}

impl HealthProfile {
    /// Start from the documented defaults.
    #[must_use]
    pub fn builder() -> HealthProfileBuilder {
        HealthProfileBuilder {
            profile: Self::default(),
        }
    }

    /// Build a profile from raw key-value input.
    ///
    /// Missing (or `null`) keys take their defaults. Numbers may be given as
    /// JSON numbers or numeric strings; integral fields accept integral floats.
    ///
    /// # Errors
    /// Returns `ProfileError` if a value has the wrong type or is out of range.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ProfileError> {
        let mut builder = Self::builder();

        if let Some(v) = present(map, "age") {
            builder = builder.age(integer_field("age", v)?);
        }
        if let Some(v) = present(map, "sex") {
            let raw = string_field("sex", v)?;
            let sex = Sex::parse(raw);
            builder = builder.sex(sex).keep_raw("sex", raw, sex == Sex::Unspecified);
        }
        if let Some(v) = present(map, "bmi") {
            builder = builder.bmi(float_field("bmi", v)?);
        }
        if let Some(v) = present(map, "smoking") {
            let raw = string_field("smoking", v)?;
            let status = YesNo::parse(raw);
            builder = builder
                .smoking(status)
                .keep_raw("smoking", raw, status == YesNo::Unrecognized);
        }
        if let Some(v) = present(map, "physical_activity") {
            let raw = string_field("physical_activity", v)?;
            let status = YesNo::parse(raw);
            builder = builder
                .physical_activity(status)
                .keep_raw("physical_activity", raw, status == YesNo::Unrecognized);
        }
        if let Some(v) = present(map, "alcohol") {
            let raw = string_field("alcohol", v)?;
            let status = YesNo::parse(raw);
            builder = builder
                .alcohol(status)
                .keep_raw("alcohol", raw, status == YesNo::Unrecognized);
        }
        if let Some(v) = present(map, "general_health") {
            let raw = string_field("general_health", v)?;
            let health = GeneralHealth::parse(raw);
            builder = builder.general_health(health).keep_raw(
                "general_health",
                raw,
                health == GeneralHealth::Unrecognized,
            );
        }
        if let Some(v) = present(map, "sleep_hours") {
            builder = builder.sleep_hours(integer_field("sleep_hours", v)?);
        }
        if let Some(v) = present(map, "diabetes") {
            let raw = string_field("diabetes", v)?;
            let status = YesNo::parse(raw);
            builder = builder
                .diabetes(status)
                .keep_raw("diabetes", raw, status == YesNo::Unrecognized);
        }

        builder.build()
    }

    /// Build a profile from a JSON value that must be an object.
    ///
    /// # Errors
    /// Returns `ProfileError::NotAnObject` for non-object input, or any
    /// field-level error from [`HealthProfile::from_map`].
    pub fn from_value(value: &Value) -> Result<Self, ProfileError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Err(ProfileError::NotAnObject),
        }
    }

    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[must_use]
    pub fn sex(&self) -> Sex {
        self.sex
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    #[must_use]
    pub fn smoking(&self) -> YesNo {
        self.smoking
    }

    #[must_use]
    pub fn physical_activity(&self) -> YesNo {
        self.physical_activity
    }

    #[must_use]
    pub fn alcohol(&self) -> YesNo {
        self.alcohol
    }

    #[must_use]
    pub fn general_health(&self) -> GeneralHealth {
        self.general_health
    }

    #[must_use]
    pub fn sleep_hours(&self) -> u32 {
        self.sleep_hours
    }

    #[must_use]
    pub fn diabetes(&self) -> YesNo {
        self.diabetes
    }

    /// Input text of a categorical field that did not parse.
    #[must_use]
    pub fn raw_text(&self, field: &str) -> Option<&str> {
        self.unrecognized
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, raw)| raw.as_str())
    }

    /// The field as the user wrote it when unrecognized, else `parsed`.
    #[must_use]
    pub fn field_text(&self, field: &str, parsed: impl std::fmt::Display) -> String {
        self.raw_text(field)
            .map_or_else(|| parsed.to_string(), str::to_string)
    }

    /// BMI formatted for user-facing text (`32.0`, `27.35`).
    #[must_use]
    pub fn bmi_display(&self) -> String {
        if self.bmi.fract() == 0.0 {
            format!("{:.1}", self.bmi)
        } else {
            format!("{}", self.bmi)
        }
    }
}

/// Builder for `HealthProfile`, seeded with the defaults.
#[derive(Debug, Clone)]
pub struct HealthProfileBuilder {
    profile: HealthProfile,
}

impl HealthProfileBuilder {
    #[must_use]
    pub fn age(mut self, age: u32) -> Self {
        self.profile.age = age;
        self
    }

    #[must_use]
    pub fn sex(mut self, sex: Sex) -> Self {
        self.profile.sex = sex;
        self
    }

    #[must_use]
    pub fn bmi(mut self, bmi: f64) -> Self {
        self.profile.bmi = bmi;
        self
    }

    #[must_use]
    pub fn smoking(mut self, status: YesNo) -> Self {
        self.profile.smoking = status;
        self
    }

    #[must_use]
    pub fn physical_activity(mut self, status: YesNo) -> Self {
        self.profile.physical_activity = status;
        self
    }

    #[must_use]
    pub fn alcohol(mut self, status: YesNo) -> Self {
        self.profile.alcohol = status;
        self
    }

    #[must_use]
    pub fn general_health(mut self, health: GeneralHealth) -> Self {
        self.profile.general_health = health;
        self
    }

    #[must_use]
    pub fn sleep_hours(mut self, hours: u32) -> Self {
        self.profile.sleep_hours = hours;
        self
    }

    #[must_use]
    pub fn diabetes(mut self, status: YesNo) -> Self {
        self.profile.diabetes = status;
        self
    }

    fn keep_raw(mut self, field: &'static str, raw: &str, unrecognized: bool) -> Self {
        self.profile.unrecognized.retain(|(name, _)| *name != field);
        if unrecognized {
            self.profile.unrecognized.push((field, raw.trim().to_string()));
        }
        self
    }

    /// Validate and freeze the profile.
    ///
    /// # Errors
    /// Returns `ProfileError::OutOfRange` for a zero age or a non-positive BMI.
    pub fn build(self) -> Result<HealthProfile, ProfileError> {
        let p = self.profile;
        if p.age == 0 {
            return Err(ProfileError::OutOfRange {
                field: "age",
                reason: "must be greater than 0".to_string(),
            });
        }
        if !p.bmi.is_finite() || p.bmi <= 0.0 {
            return Err(ProfileError::OutOfRange {
                field: "bmi",
                reason: format!("{} must be a positive number", p.bmi),
            });
        }
        Ok(p)
    }
}

fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn string_field<'a>(field: &'static str, value: &'a Value) -> Result<&'a str, ProfileError> {
    value.as_str().ok_or(ProfileError::WrongType {
        field,
        expected: "string",
    })
}

fn float_field(field: &'static str, value: &Value) -> Result<f64, ProfileError> {
    let wrong = ProfileError::WrongType {
        field,
        expected: "number",
    };
    match value {
        Value::Number(n) => n.as_f64().ok_or(wrong),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| wrong),
        _ => Err(wrong),
    }
}

fn integer_field(field: &'static str, value: &Value) -> Result<u32, ProfileError> {
    let wrong = ProfileError::WrongType {
        field,
        expected: "integer",
    };
    let raw = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i as f64,
            None => n.as_f64().ok_or(wrong.clone())?,
        },
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| wrong.clone())?,
        _ => return Err(wrong),
    };

    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(wrong);
    }
    if raw < 0.0 || raw > f64::from(u32::MAX) {
        return Err(ProfileError::OutOfRange {
            field,
            reason: format!("{raw} is not a non-negative integer"),
        });
    }
    Ok(raw as u32)
}
