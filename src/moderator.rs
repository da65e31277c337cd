// The moderation entry point.
//
// moderate(message, guidelines) parses the guidelines, extracts signals,
// runs the rule cascade and formats the verdict. Nothing is cached between
// calls: every request re-parses and re-extracts from scratch, so one
// Moderator can be shared across tasks behind an Arc.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::classify::traits::{EntityRecognizer, SentimentClassifier};
use crate::error::ModerationError;
use crate::output::truncate_chars;
use crate::policy::{self, RuleId, Verdict};
use crate::signals::SignalExtractor;

/// Structured result of one moderation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModerationOutcome {
    /// The caller-facing display string.
    pub result: String,
    pub rule: RuleId,
    pub verdict: Verdict,
}

/// Moderates messages against caller-supplied guidelines.
#[derive(Clone)]
pub struct Moderator {
    extractor: SignalExtractor,
}

impl Moderator {
    pub fn new(
        sentiment: Arc<dyn SentimentClassifier>,
        entities: Arc<dyn EntityRecognizer>,
    ) -> Self {
        Self {
            extractor: SignalExtractor::new(sentiment, entities),
        }
    }

    /// Moderate a message and return the display string.
    pub async fn moderate(&self, message: &str, guidelines: &str) -> Result<String, ModerationError> {
        Ok(self.moderate_verdict(message, guidelines).await?.result)
    }

    /// Moderate a message and return the verdict with the rule that fired.
    pub async fn moderate_verdict(
        &self,
        message: &str,
        guidelines: &str,
    ) -> Result<ModerationOutcome, ModerationError> {
        let policy = policy::parse(guidelines);
        let signals = self.extractor.extract(message, &policy).await?;
        let evaluation = policy::evaluate_traced(&policy, &signals, message);

        info!(
            rule = ?evaluation.rule,
            blocked = evaluation.verdict.is_blocked(),
            text_preview = %truncate_chars(message, 50),
            "Moderated message"
        );

        Ok(ModerationOutcome {
            result: policy::format_verdict(&evaluation.verdict),
            rule: evaluation.rule,
            verdict: evaluation.verdict,
        })
    }
}

/// A moderation request as received from an untyped caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationRequest {
    pub message: String,
    /// None means "use the configured default guidelines".
    pub guidelines: Option<String>,
}

impl ModerationRequest {
    /// Decode `{ "message": string, "guidelines"?: string | null }`.
    ///
    /// Any other shape is InvalidInput; no classifier is touched.
    pub fn from_json(value: &Value) -> Result<Self, ModerationError> {
        let Some(obj) = value.as_object() else {
            return Err(ModerationError::invalid("request", "expected a JSON object"));
        };

        let message = match obj.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(ModerationError::invalid(
                    "message",
                    format!("expected a string, got {}", json_type(other)),
                ))
            }
            None => return Err(ModerationError::invalid("message", "missing")),
        };

        let guidelines = match obj.get("guidelines") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(ModerationError::invalid(
                    "guidelines",
                    format!("expected a string, got {}", json_type(other)),
                ))
            }
        };

        Ok(Self {
            message,
            guidelines,
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_with_guidelines() {
        let req = ModerationRequest::from_json(&json!({
            "message": "hi",
            "guidelines": "allow positive"
        }))
        .unwrap();
        assert_eq!(req.message, "hi");
        assert_eq!(req.guidelines.as_deref(), Some("allow positive"));
    }

    #[test]
    fn test_request_null_guidelines_means_default() {
        let req = ModerationRequest::from_json(&json!({ "message": "", "guidelines": null })).unwrap();
        assert_eq!(req.guidelines, None);
    }

    #[test]
    fn test_request_non_string_message_rejected() {
        let err = ModerationRequest::from_json(&json!({ "message": 42 })).unwrap_err();
        assert!(matches!(
            err,
            ModerationError::InvalidInput {
                field: "message",
                ..
            }
        ));
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_request_missing_message_rejected() {
        let err = ModerationRequest::from_json(&json!({ "guidelines": "x" })).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_request_non_string_guidelines_rejected() {
        let err =
            ModerationRequest::from_json(&json!({ "message": "m", "guidelines": ["a"] })).unwrap_err();
        assert!(matches!(
            err,
            ModerationError::InvalidInput {
                field: "guidelines",
                ..
            }
        ));
    }

    #[test]
    fn test_request_must_be_object() {
        assert!(ModerationRequest::from_json(&json!("hello")).is_err());
    }
}
