//! Request and response documents.
//!
//! Parsing happens before any tier runs, so a malformed document is always
//! a client error and never reaches a provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::chat::ChatInput;
use super::plan::{PlanInput, PlanKind};
use crate::domain::{HealthProfile, RiskAssessment};
use crate::CardioriskError;

fn as_object<'a>(value: &'a Value, what: &str) -> crate::Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CardioriskError::Validation(format!("{what} must be a JSON object")))
}

/// Optional object member; `null` counts as absent.
fn optional_object<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> crate::Result<Option<&'a Map<String, Value>>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(CardioriskError::Validation(format!(
            "'{key}' must be a JSON object"
        ))),
    }
}

/// `{ "health_data": { ... } }`
///
/// # Errors
/// Returns `CardioriskError::Validation` if the wrapper or `health_data` is
/// missing, or `CardioriskError::Profile` for a bad field value.
pub fn parse_analyze(document: &Value) -> crate::Result<HealthProfile> {
    let body = as_object(document, "Request body")?;
    let health_data = optional_object(body, "health_data")?
        .ok_or_else(|| CardioriskError::Validation("Missing 'health_data' in request".into()))?;
    Ok(HealthProfile::from_map(health_data)?)
}

/// Bare nine-field profile object.
///
/// # Errors
/// Returns `CardioriskError::Profile` for non-object input or a bad field.
pub fn parse_predict(document: &Value) -> crate::Result<HealthProfile> {
    Ok(HealthProfile::from_value(document)?)
}

/// `{ "message": string?, "user_data": object? }`
///
/// A `user_data` that is not an object is ignored, as it only adds context.
///
/// # Errors
/// Returns `CardioriskError::Validation` if the body is not an object or
/// `message` is not a string.
pub fn parse_chat(document: &Value) -> crate::Result<ChatInput> {
    let body = as_object(document, "Request body")?;

    let message = match body.get("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(CardioriskError::Validation(
                "'message' must be a string".into(),
            ))
        }
    };

    let mut input = ChatInput::new(message);
    match body.get("user_data") {
        Some(Value::Object(data)) => input = input.with_user_data(data.clone()),
        None | Some(Value::Null) => {}
        Some(_) => tracing::debug!("Ignoring non-object user_data"),
    }
    Ok(input)
}

/// `{ "plan_type": "diet"|"exercise", "health_data": object? }`
///
/// # Errors
/// Returns `CardioriskError::Validation` for a missing or unknown plan type,
/// or `CardioriskError::Profile` for a bad `health_data` field.
pub fn parse_plan(document: &Value) -> crate::Result<PlanInput> {
    let body = as_object(document, "Request body")?;

    let plan_type = match body.get("plan_type") {
        None | Some(Value::Null) => "",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            return Err(CardioriskError::Validation(
                "'plan_type' must be a string".into(),
            ))
        }
    };
    let kind = PlanKind::parse(plan_type)?;

    let profile = match optional_object(body, "health_data")? {
        Some(data) => HealthProfile::from_map(data)?,
        None => HealthProfile::default(),
    };

    Ok(PlanInput { kind, profile })
}

/// A validated request, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Analyze(HealthProfile),
    Predict(HealthProfile),
    Chat(ChatInput),
    Plan(PlanInput),
}

/// `{ "plan": string }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: String,
}

/// `{ "response": string }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Response document for a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Assessment(RiskAssessment),
    Chat(ChatResponse),
    Plan(PlanResponse),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Sex, YesNo};
    use serde_json::json;

    #[test]
    fn test_analyze_requires_health_data() {
        let err = parse_analyze(&json!({"age": 40})).unwrap_err();
        assert!(matches!(err, CardioriskError::Validation(_)));
        assert!(err.is_client_error());

        let err = parse_analyze(&json!({"health_data": null})).unwrap_err();
        assert!(matches!(err, CardioriskError::Validation(_)));
    }

    #[test]
    fn test_analyze_rejects_non_object_body() {
        assert!(matches!(
            parse_analyze(&json!([1, 2])),
            Err(CardioriskError::Validation(_))
        ));
    }

    #[test]
    fn test_analyze_fills_defaults() {
        let profile = parse_analyze(&json!({"health_data": {"smoking": "YES"}})).expect("parse");
        assert_eq!(profile.smoking(), YesNo::Yes);
        assert_eq!(profile.age(), 50);
        assert_eq!(profile.sex(), Sex::Male);
    }

    #[test]
    fn test_analyze_bad_field_is_client_error() {
        let err = parse_analyze(&json!({"health_data": {"age": "old"}})).unwrap_err();
        assert!(matches!(err, CardioriskError::Profile(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_predict_takes_bare_profile() {
        let profile = parse_predict(&json!({"age": 33, "sex": "female"})).expect("parse");
        assert_eq!(profile.age(), 33);
        assert_eq!(profile.sex(), Sex::Female);
        assert!(parse_predict(&json!("nope")).is_err());
    }

    #[test]
    fn test_chat_defaults_and_types() {
        let input = parse_chat(&json!({})).expect("parse");
        assert_eq!(input.message, "");
        assert!(input.user_data.is_none());

        let input =
            parse_chat(&json!({"message": "  Hi ", "user_data": {"age": 50}})).expect("parse");
        assert_eq!(input.message, "Hi");
        assert!(input.user_data.is_some());

        let input = parse_chat(&json!({"message": "x", "user_data": "junk"})).expect("parse");
        assert!(input.user_data.is_none());

        assert!(parse_chat(&json!({"message": 5})).is_err());
    }

    #[test]
    fn test_plan_parsing() {
        let input = parse_plan(&json!({"plan_type": "Exercise"})).expect("parse");
        assert_eq!(input.kind, PlanKind::Exercise);
        assert_eq!(input.profile, HealthProfile::default());

        let input =
            parse_plan(&json!({"plan_type": "diet", "health_data": {"age": 70}})).expect("parse");
        assert_eq!(input.profile.age(), 70);

        assert!(matches!(
            parse_plan(&json!({})),
            Err(CardioriskError::Validation(_))
        ));
        assert!(matches!(
            parse_plan(&json!({"plan_type": "yoga"})),
            Err(CardioriskError::Validation(_))
        ));
    }

    #[test]
    fn test_response_documents() {
        let json = serde_json::to_value(PlanResponse { plan: "p".into() }).expect("serialize");
        assert_eq!(json, json!({"plan": "p"}));
        let json =
            serde_json::to_value(ChatResponse { response: "r".into() }).expect("serialize");
        assert_eq!(json, json!({"response": "r"}));
    }
}
