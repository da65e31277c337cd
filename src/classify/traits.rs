// Classifier traits — the seams between the policy engine and the models.
//
// The engine never talks to a model directly. It holds a SentimentClassifier
// and an EntityRecognizer behind these traits, so the local ONNX models, the
// hosted inference API, and deterministic test stubs are interchangeable.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Binary sentiment label. There is no neutral class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    /// Map a model label onto a sentiment. Anything other than POSITIVE or
    /// NEGATIVE (case-insensitive) is outside the classifier contract.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("POSITIVE") {
            Some(Sentiment::Positive)
        } else if label.eq_ignore_ascii_case("NEGATIVE") {
            Some(Sentiment::Negative)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
        }
    }
}

/// Entity category tag for people, as emitted by CoNLL-03 models.
pub const PERSON_GROUP: &str = "PER";

/// One aggregated entity span: adjacent sub-tokens of the same category
/// already merged into a single span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Category tag without the B-/I- prefix (PER, ORG, LOC, MISC).
    pub entity_group: String,
    /// Mean token confidence across the span.
    pub score: f32,
    /// The span's surface text.
    pub word: String,
    /// Offsets into the original message.
    pub start: usize,
    pub end: usize,
}

impl EntitySpan {
    pub fn is_person(&self) -> bool {
        self.entity_group == PERSON_GROUP
    }
}

/// Trait for classifying message sentiment.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Return the top sentiment label for the message.
    async fn classify(&self, text: &str) -> Result<Sentiment>;
}

/// Trait for named-entity recognition with simple span aggregation.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Return aggregated entity spans in message order.
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

/// Recognizer used when no NER model is configured. Errors if actually
/// called, so a policy that needs the person check is reported as
/// unavailable instead of silently passing.
pub struct NoopRecognizer;

#[async_trait]
impl EntityRecognizer for NoopRecognizer {
    async fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        anyhow::bail!(
            "no entity recognition model loaded; run `moderator download-model` to enable personal-name checks"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_accepts_both_cases() {
        assert_eq!(Sentiment::from_label("POSITIVE"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label("negative"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("NEUTRAL"), None);
        assert_eq!(Sentiment::from_label("LABEL_0"), None);
    }

    #[test]
    fn test_person_span() {
        let span = EntitySpan {
            entity_group: "PER".to_string(),
            score: 0.99,
            word: "John Smith".to_string(),
            start: 0,
            end: 10,
        };
        assert!(span.is_person());
    }

    #[tokio::test]
    async fn test_noop_recognizer_errors() {
        assert!(NoopRecognizer.recognize("John").await.is_err());
    }

    fn _assert_object_safe(_: &dyn SentimentClassifier, _: &dyn EntityRecognizer) {}
}
