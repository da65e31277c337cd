// Composition tests — the full moderate() path with stub classifiers.
//
// These tests exercise the data flow:
//   guidelines -> PolicyConfig -> Signals -> rule cascade -> display string
// with deterministic in-process classifiers, so no model files or network
// access are needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use moderator::classify::traits::{EntityRecognizer, EntitySpan, Sentiment, SentimentClassifier};
use moderator::error::Service;
use moderator::policy::{RuleId, DEFAULT_GUIDELINES};
use moderator::{ModerationError, Moderator};

// ============================================================
// Stub classifiers
// ============================================================

/// NEGATIVE when the message contains any listed cue word, else POSITIVE.
struct CueSentiment {
    negative_cues: Vec<&'static str>,
}

impl Default for CueSentiment {
    fn default() -> Self {
        Self {
            negative_cues: vec!["hate", "terrible", "idiot", "disgusting", "awful"],
        }
    }
}

#[async_trait]
impl SentimentClassifier for CueSentiment {
    async fn classify(&self, text: &str) -> anyhow::Result<Sentiment> {
        let lower = text.to_lowercase();
        if self.negative_cues.iter().any(|cue| lower.contains(cue)) {
            Ok(Sentiment::Negative)
        } else {
            Ok(Sentiment::Positive)
        }
    }
}

struct FailingSentiment;

#[async_trait]
impl SentimentClassifier for FailingSentiment {
    async fn classify(&self, _text: &str) -> anyhow::Result<Sentiment> {
        anyhow::bail!("model server down")
    }
}

/// Reports a PER span for each known name found in the text; counts calls.
#[derive(Default)]
struct NameRecognizer {
    names: Vec<&'static str>,
    calls: AtomicUsize,
}

impl NameRecognizer {
    fn with_names(names: &[&'static str]) -> Self {
        Self {
            names: names.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityRecognizer for NameRecognizer {
    async fn recognize(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .names
            .iter()
            .filter_map(|name| {
                text.find(name).map(|start| EntitySpan {
                    entity_group: "PER".to_string(),
                    score: 0.99,
                    word: name.to_string(),
                    start,
                    end: start + name.len(),
                })
            })
            .collect())
    }
}

fn moderator_with(recognizer: Arc<NameRecognizer>) -> Moderator {
    Moderator::new(Arc::new(CueSentiment::default()), recognizer)
}

fn default_moderator() -> Moderator {
    moderator_with(Arc::new(NameRecognizer::with_names(&["John Smith"])))
}

// ============================================================
// Scenarios with the default guidelines
// ============================================================

#[tokio::test]
async fn positive_community_message_is_allowed_positive() {
    let out = default_moderator()
        .moderate("I love this community event!", DEFAULT_GUIDELINES)
        .await
        .unwrap();
    assert!(out.starts_with("✅ Allowed (Positive):"), "got: {out}");
    assert_eq!(out, "✅ Allowed (Positive): I love this community event!");
}

#[tokio::test]
async fn cussing_is_blocked_as_inappropriate_language() {
    let out = default_moderator()
        .moderate("You are a fucking idiot", DEFAULT_GUIDELINES)
        .await
        .unwrap();
    assert_eq!(out, "❌ Message Blocked: Contains inappropriate language.");
}

#[tokio::test]
async fn negative_message_about_a_community_is_blocked() {
    let out = default_moderator()
        .moderate("I hate this gender group, they are disgusting", DEFAULT_GUIDELINES)
        .await
        .unwrap();
    assert_eq!(out, "🚫 Message Blocked: Negative content targeting a community.");
}

#[tokio::test]
async fn personal_names_are_blocked() {
    let out = default_moderator()
        .moderate("John Smith is a great person", DEFAULT_GUIDELINES)
        .await
        .unwrap();
    assert_eq!(out, "🚫 Message Blocked: Contains personal names.");
}

#[tokio::test]
async fn negative_personal_message_is_allowed_with_warning() {
    let out = default_moderator()
        .moderate("This service is terrible and slow", DEFAULT_GUIDELINES)
        .await
        .unwrap();
    assert!(
        out.starts_with("⚠️ Allowed (Negative - Personal Attack):"),
        "got: {out}"
    );
}

#[tokio::test]
async fn denylist_fires_before_positive_allow() {
    let out = default_moderator()
        .moderate("I love banana bread", "block words: banana, spam")
        .await
        .unwrap();
    assert_eq!(out, "🚫 Message Blocked: Contains restricted words.");
}

// ============================================================
// Priority and fall-through
// ============================================================

#[tokio::test]
async fn cuss_reason_wins_over_denylist_reason() {
    let guidelines = "Block cuss words.\nblock words: banana";
    let outcome = default_moderator()
        .moderate_verdict("damn this banana", guidelines)
        .await
        .unwrap();
    assert_eq!(outcome.rule, RuleId::CussWords);
    assert_eq!(outcome.result, "❌ Message Blocked: Contains inappropriate language.");
}

#[tokio::test]
async fn cuss_words_pass_without_the_block_cuss_phrase() {
    let outcome = default_moderator()
        .moderate_verdict("damn this is great", "allow positive messages")
        .await
        .unwrap();
    assert_eq!(outcome.rule, RuleId::PositiveAllow);
}

#[tokio::test]
async fn positive_without_allow_positive_is_neutral() {
    let out = default_moderator()
        .moderate("What a lovely day", "block cuss words")
        .await
        .unwrap();
    assert_eq!(out, "✅ Allowed (Neutral): What a lovely day");
}

#[tokio::test]
async fn negative_without_applicable_rule_is_neutral() {
    let outcome = default_moderator()
        .moderate_verdict("This is awful", "allow positive messages")
        .await
        .unwrap();
    assert_eq!(outcome.rule, RuleId::Default);
    assert_eq!(outcome.result, "✅ Allowed (Neutral): This is awful");
}

#[tokio::test]
async fn empty_guidelines_allow_everything() {
    let out = default_moderator()
        .moderate("I hate this group, damn them", "")
        .await
        .unwrap();
    assert_eq!(out, "✅ Allowed (Neutral): I hate this group, damn them");
}

// ============================================================
// Laziness of the person check
// ============================================================

#[tokio::test]
async fn recognizer_not_called_without_block_personal_names() {
    let recognizer = Arc::new(NameRecognizer::with_names(&["John Smith"]));
    let moderator = moderator_with(Arc::clone(&recognizer));

    let out = moderator
        .moderate("John Smith is great", "allow positive messages")
        .await
        .unwrap();

    assert_eq!(out, "✅ Allowed (Positive): John Smith is great");
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn recognizer_called_once_with_block_personal_names() {
    let recognizer = Arc::new(NameRecognizer::with_names(&[]));
    let moderator = moderator_with(Arc::clone(&recognizer));

    moderator
        .moderate("Nobody named here", "block personal names")
        .await
        .unwrap();

    assert_eq!(recognizer.calls(), 1);
}

// ============================================================
// Failure propagation and determinism
// ============================================================

#[tokio::test]
async fn sentiment_failure_is_service_unavailable_not_allowed() {
    let moderator = Moderator::new(
        Arc::new(FailingSentiment),
        Arc::new(NameRecognizer::default()),
    );
    let err = moderator
        .moderate("Anything at all", DEFAULT_GUIDELINES)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModerationError::ServiceUnavailable {
            service: Service::Sentiment,
            ..
        }
    ));
    assert!(err.to_string().contains("model server down"));
}

#[tokio::test]
async fn moderate_is_deterministic() {
    let moderator = default_moderator();
    let messages = [
        "I love this community event!",
        "You are a fucking idiot",
        "John Smith is a great person",
        "This service is terrible and slow",
    ];
    for message in messages {
        let first = moderator.moderate(message, DEFAULT_GUIDELINES).await.unwrap();
        let second = moderator.moderate(message, DEFAULT_GUIDELINES).await.unwrap();
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let moderator = Arc::new(default_moderator());
    let mut handles = Vec::new();
    for i in 0..16 {
        let moderator = Arc::clone(&moderator);
        handles.push(tokio::spawn(async move {
            let guidelines = if i % 2 == 0 {
                "block words: banana"
            } else {
                "allow positive"
            };
            moderator.moderate("banana split", guidelines).await.unwrap()
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.await.unwrap();
        if i % 2 == 0 {
            assert_eq!(out, "🚫 Message Blocked: Contains restricted words.");
        } else {
            assert_eq!(out, "✅ Allowed (Positive): banana split");
        }
    }
}
