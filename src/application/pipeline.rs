//! Pipeline: the three services wired to one set of providers.

use serde_json::Value;

use super::assessment::AssessmentService;
use super::chat::ChatService;
use super::plan::PlanService;
use super::providers::{ProviderStatus, Providers};
use super::requests::{self, ChatResponse, PlanResponse, Request, Response};
use crate::config::PipelineConfig;
use crate::domain::RiskAssessment;

/// Entry point for request documents.
///
/// Built once; every method is `&self` and safe to call from many threads.
///
/// Provider calls are blocking. Inside an async runtime, build the pipeline
/// and run requests on a blocking thread (for example
/// `tokio::task::spawn_blocking`): the HTTP client panics if it is created,
/// used or dropped on a runtime worker.
pub struct Pipeline {
    providers: Providers,
    assessment: AssessmentService,
    plans: PlanService,
    chat: ChatService,
}

impl Pipeline {
    /// Wire the services with explicit providers.
    #[must_use]
    pub fn new(providers: Providers, config: &PipelineConfig) -> Self {
        let assessment =
            AssessmentService::new(&providers, config.risk_bands, config.default_assessment);
        let plans = PlanService::new(&providers);
        let chat = ChatService::new(&providers);

        tracing::info!(
            risk_tiers = ?assessment.available_tiers(),
            reasoning = providers.completion.is_some(),
            "Pipeline ready"
        );

        Self {
            providers,
            assessment,
            plans,
            chat,
        }
    }

    /// Load providers per `config` and wire the services.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(Providers::from_config(config), config)
    }

    #[must_use]
    pub fn assessment(&self) -> &AssessmentService {
        &self.assessment
    }

    #[must_use]
    pub fn plans(&self) -> &PlanService {
        &self.plans
    }

    #[must_use]
    pub fn chat_service(&self) -> &ChatService {
        &self.chat
    }

    /// Run an already validated request.
    ///
    /// # Errors
    /// `DefaultTier` if the static default of the chosen chain fails.
    pub fn handle(&self, request: &Request) -> crate::Result<Response> {
        match request {
            Request::Analyze(profile) | Request::Predict(profile) => {
                self.assessment.assess(profile).map(Response::Assessment)
            }
            Request::Chat(input) => self
                .chat
                .reply(input)
                .map(|response| Response::Chat(ChatResponse { response })),
            Request::Plan(input) => self
                .plans
                .plan(input)
                .map(|plan| Response::Plan(PlanResponse { plan })),
        }
    }

    /// `{ "health_data": {...} }` to an explained assessment.
    ///
    /// # Errors
    /// Client errors for a malformed document; `DefaultTier` if the static
    /// default fails.
    pub fn analyze(&self, document: &Value) -> crate::Result<RiskAssessment> {
        let profile = requests::parse_analyze(document)?;
        self.assessment.assess(&profile)
    }

    /// Bare profile to an explained assessment.
    ///
    /// # Errors
    /// Same as [`Pipeline::analyze`].
    pub fn predict(&self, document: &Value) -> crate::Result<RiskAssessment> {
        let profile = requests::parse_predict(document)?;
        self.assessment.assess(&profile)
    }

    /// # Errors
    /// Client errors for a malformed document.
    pub fn chat(&self, document: &Value) -> crate::Result<ChatResponse> {
        let input = requests::parse_chat(document)?;
        let response = self.chat.reply(&input)?;
        Ok(ChatResponse { response })
    }

    /// # Errors
    /// Client errors for a malformed document or unknown plan type.
    pub fn plan(&self, document: &Value) -> crate::Result<PlanResponse> {
        let input = requests::parse_plan(document)?;
        let plan = self.plans.plan(&input)?;
        Ok(PlanResponse { plan })
    }

    #[must_use]
    pub fn status(&self) -> ProviderStatus {
        self.providers.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_WIDTH;
    use crate::ports::{CompletionError, CompletionOptions, ModelError, RiskModel, TextCompletion};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl RiskModel for CountingProvider {
        fn input_width(&self) -> usize {
            FEATURE_WIDTH
        }

        fn predict_probability(&self, _features: &[f64]) -> Result<f64, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0.5)
        }
    }

    impl TextCompletion for CountingProvider {
        fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Stay active.".into())
        }
    }

    fn offline() -> Pipeline {
        Pipeline::new(Providers::none(), &PipelineConfig::default())
    }

    fn counted() -> (Pipeline, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider::default());
        let providers = Providers::none()
            .with_model(provider.clone())
            .with_completion(provider.clone());
        (Pipeline::new(providers, &PipelineConfig::default()), provider)
    }

    #[test]
    fn test_analyze_offline_scenario() {
        let doc = json!({
            "health_data": {
                "age": 55, "sex": "Male", "bmi": 32, "smoking": "Yes",
                "physical_activity": "No", "alcohol": "No",
                "general_health": "Fair", "sleep_hours": 5, "diabetes": "Yes"
            }
        });
        let out = offline().analyze(&doc).expect("analyze");
        let json = serde_json::to_value(out).expect("serialize");
        assert_eq!(json["risk_percentage"], 25.0);
        assert_eq!(json["risk_level"], "Low Risk");
        assert_eq!(json["top_risk_factors"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["recommendations"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn test_good_sleep_scenario() {
        let doc = json!({"sleep_hours": 7, "general_health": "Good", "bmi": 22});
        let out = offline().predict(&doc).expect("predict");
        assert!(out
            .recommendations
            .contains(&"Good sleep duration: 7 hours".to_string()));
        assert!(out
            .recommendations
            .contains(&"Good self-reported health (Good) - keep it up!".to_string()));
        assert!(!out.recommendations.iter().any(|r| r.starts_with("Only")));
        assert!(!out.recommendations.iter().any(|r| r.contains("screenings and checkups")));
    }

    #[test]
    fn test_missing_health_data_is_client_error() {
        let err = offline().analyze(&json!({})).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_malformed_documents_never_reach_a_provider() {
        let (pipeline, provider) = counted();

        assert!(pipeline.analyze(&json!({})).unwrap_err().is_client_error());
        assert!(pipeline.predict(&json!({"age": "old"})).is_err());
        assert!(pipeline.chat(&json!({"message": 5})).is_err());
        assert!(pipeline.plan(&json!({"plan_type": "yoga"})).is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        pipeline
            .analyze(&json!({"health_data": {"age": 40}}))
            .expect("analyze");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_runs_validated_requests() {
        let (pipeline, _) = counted();

        let request = Request::Analyze(
            requests::parse_analyze(&json!({"health_data": {"age": 40}})).expect("parse"),
        );
        match pipeline.handle(&request).expect("handle") {
            Response::Assessment(out) => assert_eq!(out.risk_percentage, 50.0),
            other => panic!("unexpected response: {other:?}"),
        }

        let request = Request::Chat(requests::parse_chat(&json!({"message": "hi"})).expect("parse"));
        let json = serde_json::to_value(pipeline.handle(&request).expect("handle"))
            .expect("serialize");
        assert_eq!(json, json!({"response": "Stay active."}));
    }

    #[test]
    fn test_chat_and_plan_documents() {
        let p = offline();
        let chat = p.chat(&json!({"message": "hello"})).expect("chat");
        assert!(chat.response.starts_with("I'm Dr. HeartAI!"));

        let plan = p
            .plan(&json!({"plan_type": "exercise", "health_data": {"age": 40}}))
            .expect("plan");
        assert!(plan.plan.contains("Target heart rate: 108-144 BPM"));
    }

    #[test]
    fn test_pipeline_can_move_to_a_blocking_thread() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Pipeline>();
        assert_send_sync::<Request>();

        let pipeline = Arc::new(offline());
        let worker = Arc::clone(&pipeline);
        let out = std::thread::spawn(move || worker.predict(&json!({"age": 30})))
            .join()
            .expect("thread")
            .expect("predict");
        assert_eq!(out.risk_percentage, 25.0);
    }

    #[test]
    fn test_status_offline() {
        let status = offline().status();
        assert!(!status.model_loaded);
        assert!(!status.reasoning_available);
    }
}
