//! Diet and exercise plans: reasoning provider first, templated text last.

use std::sync::Arc;

use super::providers::Providers;
use super::tiered::{Resolved, Tier, TierFailure, TieredEngine};
use crate::domain::HealthProfile;
use crate::ports::{CompletionOptions, TextCompletion};
use crate::CardioriskError;

const PLAN_MAX_TOKENS: u32 = 600;

/// Kind of plan requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Diet,
    Exercise,
}

impl PlanKind {
    /// Parse case-insensitively.
    ///
    /// # Errors
    /// Returns `CardioriskError::Validation` for an empty or unknown value.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "diet" => Ok(Self::Diet),
            "exercise" => Ok(Self::Exercise),
            "" => Err(CardioriskError::Validation(
                "Missing 'plan_type'. Use 'diet' or 'exercise'".into(),
            )),
            _ => Err(CardioriskError::Validation(
                "Use 'diet' or 'exercise' for plan_type".into(),
            )),
        }
    }
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diet => write!(f, "diet"),
            Self::Exercise => write!(f, "exercise"),
        }
    }
}

/// Input to the plan chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanInput {
    pub kind: PlanKind,
    pub profile: HealthProfile,
}

/// Coarse age bracket used by the templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBracket {
    Young,
    Middle,
    Senior,
}

impl AgeBracket {
    #[must_use]
    pub fn of(age: u32) -> Self {
        match age {
            0..=39 => Self::Young,
            40..=64 => Self::Middle,
            _ => Self::Senior,
        }
    }
}

/// Target heart-rate zone in BPM: 60-80% of (220 - age).
#[must_use]
pub fn target_heart_rate(age: u32) -> (u32, u32) {
    let max = f64::from(220_u32.saturating_sub(age));
    ((max * 0.6).round() as u32, (max * 0.8).round() as u32)
}

#[must_use]
pub fn plan_prompt(input: &PlanInput) -> String {
    let p = &input.profile;
    match input.kind {
        PlanKind::Diet => format!(
            "Create a simple heart-healthy diet plan for:\n\
             Age: {}, Sex: {}, BMI: {}\n\
             Focus on practical meal ideas.",
            p.age(),
            p.field_text("sex", p.sex()),
            p.bmi_display()
        ),
        PlanKind::Exercise => format!(
            "Create a simple exercise plan for:\n\
             Age: {}, Current Activity: {}\n\
             Focus on safe, practical exercises.",
            p.age(),
            p.field_text("physical_activity", p.physical_activity())
        ),
    }
}

fn diet_template(profile: &HealthProfile) -> String {
    let mut plan = format!(
        "Personalized Heart-Healthy Diet Plan for {}-year-old {}:\n\n\
         DAILY MEAL PLAN:\n\
         • Breakfast: Oatmeal with berries OR Greek yogurt with banana\n\
         • Lunch: Grilled chicken salad OR lentil soup with whole grain bread\n\
         • Dinner: Baked salmon with vegetables OR stir-fried tofu with brown rice\n\
         • Snacks: Apple with almond butter, carrot sticks with hummus\n\n\
         HEART-HEALTHY TIPS:\n\
         1. Eat more fruits and vegetables (5+ servings daily)\n\
         2. Choose whole grains over refined grains\n\
         3. Include healthy fats (avocado, nuts, olive oil)\n\
         4. Limit processed foods and added sugars\n\
         5. Control portion sizes\n\
         6. Stay hydrated with water\n\n\
         FOODS TO FOCUS ON:\n\
         • Fruits, vegetables, whole grains\n\
         • Lean proteins (fish, poultry, beans)\n\
         • Healthy fats (nuts, seeds, olive oil)\n\
         • Low-fat dairy\n\n\
         FOODS TO LIMIT:\n\
         • Processed meats\n\
         • Sugary drinks and snacks\n\
         • High-sodium foods\n\
         • Trans fats (fried foods, baked goods)",
        profile.age(),
        profile.sex()
    );

    let mut notes = Vec::new();
    match AgeBracket::of(profile.age()) {
        AgeBracket::Young => {}
        AgeBracket::Middle => notes.push("Keep sodium under 1,500 mg/day to support healthy blood pressure"),
        AgeBracket::Senior => {
            notes.push("Keep sodium under 1,500 mg/day to support healthy blood pressure");
            notes.push("Include calcium and vitamin D sources (low-fat dairy, leafy greens)");
        }
    }
    if profile.smoking().is_yes() {
        notes.push("Add vitamin C rich foods (citrus, peppers) while working on quitting smoking");
    }
    if profile.physical_activity().is_no() {
        notes.push("Match portions to your current activity level and increase both together");
    }

    if !notes.is_empty() {
        plan.push_str("\n\nFOR YOUR PROFILE:");
        for note in notes {
            plan.push_str("\n• ");
            plan.push_str(note);
        }
    }
    plan
}

fn exercise_template(profile: &HealthProfile) -> String {
    let (low, high) = target_heart_rate(profile.age());
    let mut plan = format!(
        "Personalized Exercise Plan for {}-year-old {}:\n\n\
         WEEKLY SCHEDULE:\n\
         • Monday: 30 min brisk walking or cycling\n\
         • Tuesday: Strength training (bodyweight exercises)\n\
         • Wednesday: Rest or gentle stretching\n\
         • Thursday: 30 min swimming or elliptical\n\
         • Friday: Strength training\n\
         • Saturday: 45 min moderate activity (hiking, dancing)\n\
         • Sunday: Active rest (yoga or walking)\n\n\
         EXERCISE GUIDELINES:\n\
         1. Warm up: 5-10 min light cardio\n\
         2. Cool down: 5-10 min stretching\n\
         3. Target heart rate: {low}-{high} BPM\n\
         4. Stay hydrated before, during, after\n\
         5. Listen to your body - rest if needed",
        profile.age(),
        profile.sex()
    );

    if !profile.physical_activity().is_yes() {
        plan.push_str(
            "\n\nBEGINNER TIPS:\n\
             • Start with 10-15 min sessions\n\
             • Gradually increase duration and intensity\n\
             • Focus on consistency, not perfection\n\
             • Include rest days for recovery",
        );
    }

    match AgeBracket::of(profile.age()) {
        AgeBracket::Young => {}
        AgeBracket::Middle => plan.push_str(
            "\n\nAGE NOTE:\n• Add two mobility sessions per week to protect joints",
        ),
        AgeBracket::Senior => plan.push_str(
            "\n\nAGE NOTE:\n• Prefer low-impact cardio (walking, swimming)\n\
             • Add balance work (standing on one leg, tai chi) twice a week",
        ),
    }

    if profile.smoking().is_yes() {
        plan.push_str("\n\nSMOKING NOTE:\n• Expect lower endurance at first; quitting improves it within weeks");
    }

    plan.push_str(
        "\n\nSAFETY NOTES:\n\
         • Consult doctor before starting new exercise\n\
         • Stop if you feel pain or dizziness\n\
         • Use proper form to prevent injury\n\
         • Wear appropriate footwear",
    );
    plan
}

/// Render the static plan for a request. Pure and deterministic.
#[must_use]
pub fn template_plan(input: &PlanInput) -> String {
    match input.kind {
        PlanKind::Diet => diet_template(&input.profile),
        PlanKind::Exercise => exercise_template(&input.profile),
    }
}

/// Tier 1: reasoning provider.
pub struct ReasoningPlanTier {
    completion: Option<Arc<dyn TextCompletion>>,
}

impl ReasoningPlanTier {
    #[must_use]
    pub fn new(completion: Option<Arc<dyn TextCompletion>>) -> Self {
        Self { completion }
    }
}

impl Tier<PlanInput, String> for ReasoningPlanTier {
    fn name(&self) -> &str {
        "reasoning"
    }

    fn is_available(&self) -> bool {
        self.completion.is_some()
    }

    fn attempt(&self, input: &PlanInput) -> Result<String, TierFailure> {
        let completion = self.completion.as_ref().ok_or(TierFailure::Unavailable)?;
        completion
            .complete(
                &plan_prompt(input),
                &CompletionOptions::with_max_tokens(PLAN_MAX_TOKENS),
            )
            .map_err(|e| TierFailure::Provider(e.to_string()))
    }
}

/// Tier 2: static template.
pub struct TemplatePlanTier;

impl Tier<PlanInput, String> for TemplatePlanTier {
    fn name(&self) -> &str {
        "template"
    }

    fn attempt(&self, input: &PlanInput) -> Result<String, TierFailure> {
        Ok(template_plan(input))
    }
}

/// Produces diet and exercise plans.
pub struct PlanService {
    engine: TieredEngine<PlanInput, String>,
}

impl PlanService {
    #[must_use]
    pub fn new(providers: &Providers) -> Self {
        let engine =
            TieredEngine::<PlanInput, String>::new(Box::new(TemplatePlanTier))
                .with_tier(Box::new(ReasoningPlanTier::new(providers.completion.clone())));
        Self { engine }
    }

    /// Generate a plan and report which tier wrote it.
    ///
    /// # Errors
    /// Returns `CardioriskError::DefaultTier` if the template produced nothing.
    pub fn plan_resolved(&self, input: &PlanInput) -> crate::Result<Resolved<String>> {
        tracing::info!(kind = %input.kind, age = input.profile.age(), "Generating plan");
        let resolved = self.engine.run(input)?;
        tracing::info!(kind = %input.kind, tier = %resolved.tier, "Plan generated");
        Ok(resolved)
    }

    /// Generate a plan.
    ///
    /// # Errors
    /// See [`PlanService::plan_resolved`].
    pub fn plan(&self, input: &PlanInput) -> crate::Result<String> {
        self.plan_resolved(input).map(|r| r.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Sex, YesNo};
    use crate::ports::CompletionError;

    struct Echo(Result<String, CompletionError>);

    impl TextCompletion for Echo {
        fn complete(
            &self,
            _prompt: &str,
            options: &CompletionOptions,
        ) -> Result<String, CompletionError> {
            assert_eq!(options.max_tokens, PLAN_MAX_TOKENS);
            self.0.clone()
        }
    }

    fn input(kind: PlanKind, age: u32) -> PlanInput {
        PlanInput {
            kind,
            profile: HealthProfile::builder()
                .age(age)
                .sex(Sex::Female)
                .build()
                .expect("valid"),
        }
    }

    #[test]
    fn test_plan_kind_parse() {
        assert_eq!(PlanKind::parse("DIET").expect("diet"), PlanKind::Diet);
        assert_eq!(PlanKind::parse(" exercise ").expect("ex"), PlanKind::Exercise);
        assert!(matches!(
            PlanKind::parse(""),
            Err(CardioriskError::Validation(_))
        ));
        assert!(matches!(
            PlanKind::parse("sleep"),
            Err(CardioriskError::Validation(_))
        ));
    }

    #[test]
    fn test_target_heart_rate() {
        assert_eq!(target_heart_rate(50), (102, 136));
        assert_eq!(target_heart_rate(20), (120, 160));
        assert_eq!(target_heart_rate(300), (0, 0));
    }

    #[test]
    fn test_age_brackets() {
        assert_eq!(AgeBracket::of(39), AgeBracket::Young);
        assert_eq!(AgeBracket::of(40), AgeBracket::Middle);
        assert_eq!(AgeBracket::of(64), AgeBracket::Middle);
        assert_eq!(AgeBracket::of(65), AgeBracket::Senior);
    }

    #[test]
    fn test_template_used_without_provider() {
        let svc = PlanService::new(&Providers::none());
        let resolved = svc.plan_resolved(&input(PlanKind::Diet, 52)).expect("plan");
        assert_eq!(resolved.tier, "template");
        assert!(resolved
            .value
            .starts_with("Personalized Heart-Healthy Diet Plan for 52-year-old Female:"));
        assert!(resolved.value.contains("sodium"));
    }

    #[test]
    fn test_exercise_template_has_heart_rate_zone() {
        let plan = template_plan(&input(PlanKind::Exercise, 50));
        assert!(plan.contains("Target heart rate: 102-136 BPM"));
        assert!(!plan.contains("BEGINNER TIPS"));
    }

    #[test]
    fn test_inactive_profile_gets_beginner_tips() {
        let profile = HealthProfile::builder()
            .physical_activity(YesNo::No)
            .build()
            .expect("valid");
        let plan = template_plan(&PlanInput {
            kind: PlanKind::Exercise,
            profile,
        });
        assert!(plan.contains("BEGINNER TIPS"));
    }

    #[test]
    fn test_reasoning_plan_preferred() {
        let providers =
            Providers::none().with_completion(Arc::new(Echo(Ok("Eat oats.".to_string()))));
        let svc = PlanService::new(&providers);
        assert_eq!(
            svc.plan(&input(PlanKind::Diet, 30)).expect("plan"),
            "Eat oats."
        );
    }

    #[test]
    fn test_empty_reasoning_plan_falls_back() {
        let providers = Providers::none().with_completion(Arc::new(Echo(Ok("  \n".to_string()))));
        let svc = PlanService::new(&providers);
        let resolved = svc
            .plan_resolved(&input(PlanKind::Exercise, 30))
            .expect("plan");
        assert_eq!(resolved.tier, "template");
    }

    #[test]
    fn test_provider_error_falls_back() {
        let providers = Providers::none()
            .with_completion(Arc::new(Echo(Err(CompletionError::Timeout(60)))));
        let svc = PlanService::new(&providers);
        assert!(svc
            .plan(&input(PlanKind::Diet, 70))
            .expect("plan")
            .contains("calcium"));
    }

    #[test]
    fn test_prompts() {
        assert!(plan_prompt(&input(PlanKind::Diet, 30)).contains("Age: 30, Sex: Female, BMI: 25.0"));
        assert!(plan_prompt(&input(PlanKind::Exercise, 30)).contains("Current Activity: Yes"));
    }
}
