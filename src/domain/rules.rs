//! Rule tables for risk factors and recommendations.
//!
//! Rules run in declaration order and their output is kept in that order.
//! Truncation keeps the first N results; it never re-ranks by impact.

use super::assessment::{Impact, RiskFactor};
use super::profile::HealthProfile;

/// Maximum number of risk factors in a response.
pub const MAX_RISK_FACTORS: usize = 3;

/// Maximum number of recommendations in a response.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Fires when no other recommendation applies.
pub const CATCH_ALL_RECOMMENDATION: &str = "Keep maintaining healthy lifestyle!";

/// A predicate over the profile with a fixed factor payload.
pub struct FactorRule {
    pub factor: &'static str,
    pub impact: Impact,
    pub applies: fn(&HealthProfile) -> bool,
}

/// A per-field rule producing at most one piece of advice: the concerning
/// message, the affirming one, or nothing.
pub struct AdviceRule {
    pub field: &'static str,
    pub advise: fn(&HealthProfile) -> Option<String>,
}

pub const FACTOR_RULES: &[FactorRule] = &[
    FactorRule {
        factor: "Smoking",
        impact: Impact::High,
        applies: is_smoker,
    },
    FactorRule {
        factor: "High BMI",
        impact: Impact::High,
        applies: is_obese,
    },
    FactorRule {
        factor: "Low Physical Activity",
        impact: Impact::Medium,
        applies: is_inactive,
    },
    FactorRule {
        factor: "Poor Sleep",
        impact: Impact::Medium,
        applies: sleeps_poorly,
    },
    FactorRule {
        factor: "Diabetes",
        impact: Impact::High,
        applies: is_diabetic,
    },
];

pub const ADVICE_RULES: &[AdviceRule] = &[
    AdviceRule {
        field: "smoking",
        advise: smoking_advice,
    },
    AdviceRule {
        field: "bmi",
        advise: bmi_advice,
    },
    AdviceRule {
        field: "physical_activity",
        advise: activity_advice,
    },
    AdviceRule {
        field: "sleep_hours",
        advise: sleep_advice,
    },
    AdviceRule {
        field: "diabetes",
        advise: diabetes_advice,
    },
    AdviceRule {
        field: "general_health",
        advise: general_health_advice,
    },
    AdviceRule {
        field: "alcohol",
        advise: alcohol_advice,
    },
    AdviceRule {
        field: "age",
        advise: age_advice,
    },
];

fn is_smoker(p: &HealthProfile) -> bool {
    p.smoking().is_yes()
}

fn is_obese(p: &HealthProfile) -> bool {
    p.bmi() > 30.0
}

fn is_inactive(p: &HealthProfile) -> bool {
    p.physical_activity().is_no()
}

fn sleeps_poorly(p: &HealthProfile) -> bool {
    p.sleep_hours() < 6 || p.sleep_hours() > 9
}

fn is_diabetic(p: &HealthProfile) -> bool {
    p.diabetes().is_yes()
}

fn smoking_advice(p: &HealthProfile) -> Option<String> {
    if p.smoking().is_yes() {
        Some("Quit smoking - reduces CVD risk by 50% within 1 year".to_string())
    } else if p.smoking().is_no() {
        Some("Great job not smoking! Continue avoiding tobacco products".to_string())
    } else {
        None
    }
}

fn bmi_advice(p: &HealthProfile) -> Option<String> {
    if p.bmi() > 30.0 {
        Some(format!(
            "High BMI ({}): Aim to lose weight through diet and exercise",
            p.bmi_display()
        ))
    } else if p.bmi() >= 25.0 {
        Some(format!(
            "BMI {}: Maintain healthy weight with balanced diet",
            p.bmi_display()
        ))
    } else {
        None
    }
}

fn activity_advice(p: &HealthProfile) -> Option<String> {
    if p.physical_activity().is_no() {
        Some("Start with 30 minutes of moderate exercise 5 days/week".to_string())
    } else if p.physical_activity().is_yes() {
        Some("Keep up the good work with regular physical activity".to_string())
    } else {
        None
    }
}

fn sleep_advice(p: &HealthProfile) -> Option<String> {
    let hours = p.sleep_hours();
    Some(if hours < 7 {
        format!("Only {hours} hours sleep: Aim for 7-8 hours for heart health")
    } else if hours > 9 {
        format!("Excessive sleep ({hours} hours): 7-8 hours is optimal")
    } else {
        format!("Good sleep duration: {hours} hours")
    })
}

fn diabetes_advice(p: &HealthProfile) -> Option<String> {
    if p.diabetes().is_yes() {
        Some("Manage diabetes carefully with regular checkups".to_string())
    } else if p.diabetes().is_no() {
        Some("No diabetes - excellent for heart health".to_string())
    } else {
        None
    }
}

fn general_health_advice(p: &HealthProfile) -> Option<String> {
    let health = p.general_health();
    if health.is_concerning() {
        Some("Consider regular health screenings and checkups".to_string())
    } else if health.is_affirming() {
        Some(format!("Good self-reported health ({health}) - keep it up!"))
    } else {
        None
    }
}

fn alcohol_advice(p: &HealthProfile) -> Option<String> {
    if p.alcohol().is_yes() {
        Some("Limit alcohol to 1-2 drinks per day for heart health".to_string())
    } else if p.alcohol().is_no() {
        Some("No alcohol consumption - good for overall health".to_string())
    } else {
        None
    }
}

fn age_advice(p: &HealthProfile) -> Option<String> {
    let age = p.age();
    Some(if age > 45 {
        format!("At age {age}, regular heart health screenings are recommended")
    } else {
        format!("At age {age}, focus on prevention through healthy lifestyle")
    })
}

/// Every matching factor, in rule order.
#[must_use]
pub fn matching_risk_factors(profile: &HealthProfile) -> Vec<RiskFactor> {
    FACTOR_RULES
        .iter()
        .filter(|rule| (rule.applies)(profile))
        .map(|rule| RiskFactor::new(rule.factor, rule.impact))
        .collect()
}

/// Advice from `rules`, in order, with the catch-all when none applies.
#[must_use]
pub fn advise(rules: &[AdviceRule], profile: &HealthProfile) -> Vec<String> {
    let mut out: Vec<String> = rules
        .iter()
        .filter_map(|rule| (rule.advise)(profile))
        .collect();

    if out.is_empty() {
        out.push(CATCH_ALL_RECOMMENDATION.to_string());
    }
    out
}

/// Every piece of advice from [`ADVICE_RULES`].
#[must_use]
pub fn all_recommendations(profile: &HealthProfile) -> Vec<String> {
    advise(ADVICE_RULES, profile)
}

/// First `MAX_RISK_FACTORS` matching factors.
#[must_use]
pub fn top_risk_factors(profile: &HealthProfile) -> Vec<RiskFactor> {
    let mut factors = matching_risk_factors(profile);
    factors.truncate(MAX_RISK_FACTORS);
    factors
}

/// First `MAX_RECOMMENDATIONS` recommendations.
#[must_use]
pub fn recommendations(profile: &HealthProfile) -> Vec<String> {
    let mut recs = all_recommendations(profile);
    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{GeneralHealth, Sex, YesNo};

    fn severe_profile() -> HealthProfile {
        HealthProfile::builder()
            .age(55)
            .sex(Sex::Male)
            .bmi(32.0)
            .smoking(YesNo::Yes)
            .physical_activity(YesNo::No)
            .alcohol(YesNo::No)
            .general_health(GeneralHealth::Fair)
            .sleep_hours(5)
            .diabetes(YesNo::Yes)
            .build()
            .expect("valid")
    }

    #[test]
    fn test_catch_all_when_no_rule_applies() {
        let silent = [AdviceRule {
            field: "sleep_hours",
            advise: |_| None,
        }];
        assert_eq!(
            advise(&silent, &severe_profile()),
            vec![CATCH_ALL_RECOMMENDATION.to_string()]
        );
        assert_eq!(advise(&[], &HealthProfile::default()), vec!["Keep maintaining healthy lifestyle!"]);
    }

    #[test]
    fn test_catch_all_absent_when_advice_exists() {
        let recs = all_recommendations(&HealthProfile::default());
        assert!(!recs.is_empty());
        assert!(!recs.iter().any(|r| r == CATCH_ALL_RECOMMENDATION));
    }

    #[test]
    fn test_factors_capped_in_rule_order() {
        let profile = severe_profile();
        assert_eq!(matching_risk_factors(&profile).len(), 5);

        let top = top_risk_factors(&profile);
        assert_eq!(
            top,
            vec![
                RiskFactor::new("Smoking", Impact::High),
                RiskFactor::new("High BMI", Impact::High),
                RiskFactor::new("Low Physical Activity", Impact::Medium),
            ]
        );
    }

    #[test]
    fn test_truncation_is_positional_not_by_severity() {
        // Poor sleep (Medium) is declared before diabetes (High) and wins the last slot.
        let profile = HealthProfile::builder()
            .smoking(YesNo::Yes)
            .bmi(31.0)
            .sleep_hours(4)
            .diabetes(YesNo::Yes)
            .build()
            .expect("valid");

        let top = top_risk_factors(&profile);
        assert_eq!(top.len(), 3);
        assert_eq!(top[2], RiskFactor::new("Poor Sleep", Impact::Medium));
    }

    #[test]
    fn test_severe_profile_recommendations() {
        let recs = recommendations(&severe_profile());
        assert_eq!(
            recs,
            vec![
                "Quit smoking - reduces CVD risk by 50% within 1 year".to_string(),
                "High BMI (32.0): Aim to lose weight through diet and exercise".to_string(),
                "Start with 30 minutes of moderate exercise 5 days/week".to_string(),
                "Only 5 hours sleep: Aim for 7-8 hours for heart health".to_string(),
                "Manage diabetes carefully with regular checkups".to_string(),
            ]
        );
        assert_eq!(all_recommendations(&severe_profile()).len(), 8);
    }

    #[test]
    fn test_good_sleep_and_health_affirmed() {
        let profile = HealthProfile::builder()
            .bmi(22.0)
            .sleep_hours(7)
            .general_health(GeneralHealth::Good)
            .build()
            .expect("valid");

        let recs = recommendations(&profile);
        assert!(recs.contains(&"Good sleep duration: 7 hours".to_string()));
        assert!(recs.contains(&"Good self-reported health (Good) - keep it up!".to_string()));
        assert!(!recs.iter().any(|r| r.contains("Only") || r.contains("Excessive")));
        assert!(!recs.iter().any(|r| r.contains("screenings and checkups")));
    }

    #[test]
    fn test_no_factors_for_healthy_profile() {
        assert!(matching_risk_factors(&HealthProfile::default()).is_empty());
    }

    #[test]
    fn test_unrecognized_fields_fire_neither_rule() {
        let profile = HealthProfile::builder()
            .smoking(YesNo::Unrecognized)
            .alcohol(YesNo::Unrecognized)
            .general_health(GeneralHealth::Unrecognized)
            .build()
            .expect("valid");
        let recs = all_recommendations(&profile);
        assert!(!recs.iter().any(|r| r.contains("smoking") || r.contains("alcohol")));
        assert!(!recs.iter().any(|r| r.contains("self-reported")));
    }

    #[test]
    fn test_sleep_boundaries() {
        let at = |h| {
            HealthProfile::builder()
                .sleep_hours(h)
                .build()
                .expect("valid")
        };
        assert!(matching_risk_factors(&at(6)).is_empty());
        assert!(matching_risk_factors(&at(9)).is_empty());
        assert_eq!(matching_risk_factors(&at(10))[0].factor, "Poor Sleep");
        assert_eq!(
            all_recommendations(&at(10))[3],
            "Excessive sleep (10 hours): 7-8 hours is optimal"
        );
    }

    #[test]
    fn test_young_adult_prevention_advice() {
        let profile = HealthProfile::builder().age(30).build().expect("valid");
        let recs = all_recommendations(&profile);
        assert_eq!(
            recs.last().map(String::as_str),
            Some("At age 30, focus on prevention through healthy lifestyle")
        );
    }

    #[test]
    fn test_every_profile_field_except_sex_has_a_rule() {
        let fields: Vec<&str> = ADVICE_RULES.iter().map(|r| r.field).collect();
        for f in [
            "smoking",
            "bmi",
            "physical_activity",
            "sleep_hours",
            "diabetes",
            "general_health",
            "alcohol",
            "age",
        ] {
            assert!(fields.contains(&f), "missing rule for {f}");
        }
    }
}
