//! Fixed-width feature layout for the primary risk model.
//!
//! The model was trained on a 277-column design matrix. Only the first eight
//! columns are populated from a `HealthProfile`; the rest are placeholders
//! for features the profile does not carry and stay zero.

use super::profile::{HealthProfile, Sex};

/// Input width expected by the primary model.
pub const FEATURE_WIDTH: usize = 277;

/// Version of the field-to-position table below. Bump on any change.
pub const FEATURE_LAYOUT_VERSION: u32 = 1;

/// Named features populated from a profile, with their column positions.
/// Order: Age, Sex, BMI, Smoking, PhysicalActivity, AlcoholDrinking, SleepHours, Diabetic
pub const ENCODED_FEATURES: [(&str, usize); 8] = [
    ("Age", 0),
    ("Sex", 1),
    ("BMI", 2),
    ("Smoking", 3),
    ("PhysicalActivity", 4),
    ("AlcoholDrinking", 5),
    ("SleepHours", 6),
    ("Diabetic", 7),
];

/// Fixed-width numeric encoding of a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Wrap raw values (e.g. the output of a normalizer).
    #[must_use]
    pub fn from_raw(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of a named feature, if it is part of the layout.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<f64> {
        ENCODED_FEATURES
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, idx)| self.0.get(*idx).copied())
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Encode a profile into the fixed layout. Total and deterministic.
#[must_use]
pub fn encode(profile: &HealthProfile) -> FeatureVector {
    let mut v = vec![0.0; FEATURE_WIDTH];

    let values = [
        f64::from(profile.age()),
        flag(profile.sex() == Sex::Male),
        profile.bmi(),
        flag(profile.smoking().is_yes()),
        flag(profile.physical_activity().is_yes()),
        flag(profile.alcohol().is_yes()),
        f64::from(profile.sleep_hours()),
        flag(profile.diabetes().is_yes()),
    ];

    for ((_, idx), value) in ENCODED_FEATURES.iter().zip(values) {
        v[*idx] = value;
    }

    FeatureVector(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{GeneralHealth, YesNo};
    use proptest::prelude::*;

    #[test]
    fn test_encode_known_positions() {
        let profile = HealthProfile::builder()
            .age(55)
            .sex(Sex::Male)
            .bmi(32.0)
            .smoking(YesNo::Yes)
            .physical_activity(YesNo::No)
            .alcohol(YesNo::No)
            .sleep_hours(5)
            .diabetes(YesNo::Yes)
            .build()
            .expect("valid");

        let v = encode(&profile);
        assert_eq!(v.len(), FEATURE_WIDTH);
        assert_eq!(
            &v.as_slice()[..8],
            &[55.0, 1.0, 32.0, 1.0, 0.0, 0.0, 5.0, 1.0]
        );
        assert_eq!(v.feature("BMI"), Some(32.0));
        assert_eq!(v.feature("Cholesterol"), None);
    }

    #[test]
    fn test_unrecognized_statuses_encode_as_zero() {
        let profile = HealthProfile::builder()
            .sex(Sex::Unspecified)
            .smoking(YesNo::Unrecognized)
            .physical_activity(YesNo::Unrecognized)
            .build()
            .expect("valid");
        let v = encode(&profile);
        assert_eq!(v.feature("Sex"), Some(0.0));
        assert_eq!(v.feature("Smoking"), Some(0.0));
        assert_eq!(v.feature("PhysicalActivity"), Some(0.0));
    }

    #[test]
    fn test_layout_positions_are_unique_and_in_range() {
        let mut seen = std::collections::HashSet::new();
        for (_, idx) in ENCODED_FEATURES {
            assert!(idx < FEATURE_WIDTH);
            assert!(seen.insert(idx), "duplicate position {idx}");
        }
    }

    fn arb_status() -> impl Strategy<Value = YesNo> {
        prop_oneof![Just(YesNo::Yes), Just(YesNo::No), Just(YesNo::Unrecognized)]
    }

    proptest! {
        #[test]
        fn prop_encode_is_fixed_width_and_zero_elsewhere(
            age in 1u32..120,
            bmi in 10.0f64..60.0,
            sleep in 0u32..16,
            male in any::<bool>(),
            smoking in arb_status(),
            active in arb_status(),
            alcohol in arb_status(),
            diabetes in arb_status(),
        ) {
            let profile = HealthProfile::builder()
                .age(age)
                .sex(if male { Sex::Male } else { Sex::Female })
                .bmi(bmi)
                .smoking(smoking)
                .physical_activity(active)
                .alcohol(alcohol)
                .general_health(GeneralHealth::Fair)
                .sleep_hours(sleep)
                .diabetes(diabetes)
                .build()
                .expect("valid");

            let v = encode(&profile);
            prop_assert_eq!(v.len(), FEATURE_WIDTH);
            let populated: Vec<usize> = ENCODED_FEATURES.iter().map(|(_, i)| *i).collect();
            for (i, x) in v.as_slice().iter().enumerate() {
                if !populated.contains(&i) {
                    prop_assert_eq!(*x, 0.0);
                }
            }
            prop_assert_eq!(encode(&profile), v);
        }
    }
}
