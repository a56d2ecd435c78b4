//! Heart-health chat: reasoning provider first, canned reply per intent last.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::providers::Providers;
use super::tiered::{Resolved, Tier, TierFailure, TieredEngine};
use crate::ports::{CompletionOptions, TextCompletion};

const CHAT_MAX_TOKENS: u32 = 600;
const CHAT_TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are Dr. HeartAI, a professional AI health assistant specializing in cardiovascular health.

IMPORTANT RULES:
1. NEVER show internal system notes or technical details to the user
2. Always provide personalized, actionable advice when health data is available
3. If no health data is provided, ask relevant questions to gather information
4. Structure clear, organized responses with specific recommendations
5. Focus on heart health but maintain general wellness perspective
6. Use a supportive, encouraging tone
7. Never repeat the exact same response consecutively
8. If analysis is requested but data is limited, explain what insights CAN be provided

RESPONSE FORMAT GUIDELINES:
- Start with a brief acknowledgment
- Provide findings in bullet points when appropriate
- Include specific recommendations
- End with options for next steps or questions";

const ANALYSIS_INSTRUCTION: &str = "ANALYSIS REQUESTED: Provide detailed findings and actionable recommendations based on the above data. Identify potential areas for improvement.";

/// What the user is asking about. Drives both the canned reply and the
/// prompt hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIntent {
    Greeting,
    AnalysisRequest,
    Diet,
    Exercise,
    Repetition,
    General,
}

// First match wins.
const KEYWORDS: &[(ChatIntent, &[&str])] = &[
    (ChatIntent::AnalysisRequest, &["analysis", "report", "wrong"]),
    (ChatIntent::Diet, &["diet", "food"]),
    (ChatIntent::Exercise, &["exercise", "workout"]),
    (ChatIntent::Repetition, &["same", "again", "repeat"]),
];

impl ChatIntent {
    /// Classify a message by keyword containment, case-insensitively.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.trim().to_lowercase();
        if matches!(lower.as_str(), "hello" | "hi" | "hey") {
            return Self::Greeting;
        }
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map_or(Self::General, |(intent, _)| *intent)
    }

    /// Deterministic fallback reply.
    #[must_use]
    pub fn canned_reply(self) -> &'static str {
        match self {
            Self::Greeting => "I'm Dr. HeartAI! For personalized advice, please share your health data or ask specific questions.",
            Self::AnalysisRequest => "I'd love to analyze your health data! For personalized insights, please upload your health profile or share key metrics like blood pressure, cholesterol levels, and activity habits.",
            Self::Diet => "Basic heart-healthy diet: Focus on fruits, vegetables, whole grains, and lean proteins. Limit processed foods and added sugars. Ask for a diet plan for a version tailored to you.",
            Self::Exercise => "Basic exercise: Aim for 150 min moderate exercise per week. Include cardio, strength, and flexibility training. Ask for an exercise plan for a weekly schedule.",
            Self::Repetition => "I can help with diet plans, exercise routines, or analyzing health metrics. What would you like to focus on today?",
            Self::General => "Your heart health is important! Would you like to discuss diet, exercise, or general heart health tips?",
        }
    }

    /// Prompt hint for the reasoning provider.
    #[must_use]
    pub fn prompt_hint(self) -> Option<&'static str> {
        match self {
            Self::Greeting => Some("User is greeting. Provide warm welcome and ask how you can help."),
            Self::AnalysisRequest => Some("User wants health analysis. Be specific and data-driven."),
            Self::Diet => Some("User asking about nutrition. Focus on heart-healthy eating."),
            Self::Exercise => Some("User asking about physical activity. Focus on cardiovascular benefits."),
            Self::Repetition => Some("User seems to be asking for repeated information. Provide variation or ask for clarification."),
            Self::General => None,
        }
    }
}

/// Input to the chat chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInput {
    pub message: String,
    pub user_data: Option<Map<String, Value>>,
}

impl ChatInput {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_data: None,
        }
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: Map<String, Value>) -> Self {
        self.user_data = Some(user_data);
        self
    }

    #[must_use]
    pub fn intent(&self) -> ChatIntent {
        ChatIntent::classify(&self.message)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the full chat prompt.
#[must_use]
pub fn chat_prompt(input: &ChatInput) -> String {
    let intent = input.intent();

    let mut context = String::new();
    if let Some(data) = input.user_data.as_ref().filter(|d| !d.is_empty()) {
        context.push_str("USER HEALTH DATA:\n");
        for (key, value) in data {
            context.push_str(&format!("- {key}: {}\n", display_value(value)));
        }
        if intent == ChatIntent::AnalysisRequest {
            context.push('\n');
            context.push_str(ANALYSIS_INSTRUCTION);
        }
    }

    format!(
        "{SYSTEM_PROMPT}\n\n{context}\n\n{}\n\nUSER MESSAGE: {}\n\nYOUR RESPONSE:",
        intent.prompt_hint().unwrap_or_default(),
        input.message.trim()
    )
}

fn is_internal_heading(line: &str) -> bool {
    line.contains("##") && line.contains("Internal")
}

/// Remove "## Internal ..." sections from a reply.
///
/// A section runs from its heading up to (not including) the next `##`
/// heading, or to the end of the text.
#[must_use]
pub fn strip_internal_notes(reply: &str) -> String {
    if !(reply.contains("##") && reply.contains("Internal")) {
        return reply.trim().to_string();
    }

    let mut kept = Vec::new();
    let mut in_internal = false;
    for line in reply.lines() {
        if is_internal_heading(line) {
            in_internal = true;
            continue;
        }
        if in_internal && line.contains("##") {
            in_internal = false;
        }
        if !in_internal {
            kept.push(line);
        }
    }
    kept.join("\n").trim().to_string()
}

/// Tier 1: reasoning provider with the assistant persona.
pub struct ReasoningChatTier {
    completion: Option<Arc<dyn TextCompletion>>,
}

impl ReasoningChatTier {
    #[must_use]
    pub fn new(completion: Option<Arc<dyn TextCompletion>>) -> Self {
        Self { completion }
    }
}

impl Tier<ChatInput, String> for ReasoningChatTier {
    fn name(&self) -> &str {
        "reasoning"
    }

    fn is_available(&self) -> bool {
        self.completion.is_some()
    }

    fn attempt(&self, input: &ChatInput) -> Result<String, TierFailure> {
        let completion = self.completion.as_ref().ok_or(TierFailure::Unavailable)?;
        let options = CompletionOptions::with_max_tokens(CHAT_MAX_TOKENS).temperature(CHAT_TEMPERATURE);
        let reply = completion
            .complete(&chat_prompt(input), &options)
            .map_err(|e| TierFailure::Provider(e.to_string()))?;
        Ok(strip_internal_notes(&reply))
    }
}

/// Tier 2: canned reply keyed on intent.
pub struct CannedChatTier;

impl Tier<ChatInput, String> for CannedChatTier {
    fn name(&self) -> &str {
        "canned"
    }

    fn attempt(&self, input: &ChatInput) -> Result<String, TierFailure> {
        Ok(input.intent().canned_reply().to_string())
    }
}

/// Answers heart-health chat messages.
pub struct ChatService {
    engine: TieredEngine<ChatInput, String>,
}

impl ChatService {
    #[must_use]
    pub fn new(providers: &Providers) -> Self {
        let engine =
            TieredEngine::<ChatInput, String>::new(Box::new(CannedChatTier))
                .with_tier(Box::new(ReasoningChatTier::new(providers.completion.clone())));
        Self { engine }
    }

    /// Reply to a message and report which tier answered.
    ///
    /// # Errors
    /// Returns `CardioriskError::DefaultTier` if the canned tier produced nothing.
    pub fn reply_resolved(&self, input: &ChatInput) -> crate::Result<Resolved<String>> {
        let intent = input.intent();
        let resolved = self.engine.run(input)?;
        tracing::info!(
            intent = ?intent,
            tier = %resolved.tier,
            has_user_data = input.user_data.is_some(),
            "Chat reply produced"
        );
        Ok(resolved)
    }

    /// Reply to a message.
    ///
    /// # Errors
    /// See [`ChatService::reply_resolved`].
    pub fn reply(&self, input: &ChatInput) -> crate::Result<String> {
        self.reply_resolved(input).map(|r| r.value)
    }
}
