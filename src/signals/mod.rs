// Signal extraction — everything the rules need to know about one message.
//
// Lexical signals are computed locally and can't fail. The sentiment label
// always comes from the injected classifier. The person check is the
// expensive one: it only runs when the policy blocks personal names, since
// otherwise its answer can't change the verdict.

pub mod lexicon;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::traits::{EntityRecognizer, Sentiment, SentimentClassifier};
use crate::error::{ModerationError, Service};
use crate::policy::PolicyConfig;

/// Per-message signals consumed by the rule cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signals {
    pub sentiment: Sentiment,
    pub tokens: BTreeSet<String>,
    pub contains_cuss_word: bool,
    pub contains_blocked_word: bool,
    pub contains_community_term: bool,
    /// Always false when the policy didn't ask for the person check.
    pub person_entities_present: bool,
}

impl Signals {
    /// Signals with the given sentiment and no lexical matches.
    pub fn with_sentiment(sentiment: Sentiment) -> Self {
        Self {
            sentiment,
            tokens: BTreeSet::new(),
            contains_cuss_word: false,
            contains_blocked_word: false,
            contains_community_term: false,
            person_entities_present: false,
        }
    }

    /// Compute the lexical signals for a message under a policy.
    pub fn lexical(message: &str, sentiment: Sentiment, policy: &PolicyConfig) -> Self {
        let tokens = lexicon::tokenize(message);
        Self {
            sentiment,
            contains_cuss_word: lexicon::contains_cuss_word(&tokens),
            contains_blocked_word: lexicon::contains_blocked_word(&tokens, &policy.blocked_words),
            contains_community_term: lexicon::contains_community_term(message),
            person_entities_present: false,
            tokens,
        }
    }
}

/// Wraps the two classifiers and the lexical analyzers.
#[derive(Clone)]
pub struct SignalExtractor {
    sentiment: Arc<dyn SentimentClassifier>,
    entities: Arc<dyn EntityRecognizer>,
}

impl SignalExtractor {
    pub fn new(sentiment: Arc<dyn SentimentClassifier>, entities: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            sentiment,
            entities,
        }
    }

    /// Extract all signals for `message` under `policy`.
    ///
    /// Classifier failures abort extraction with ServiceUnavailable.
    pub async fn extract(
        &self,
        message: &str,
        policy: &PolicyConfig,
    ) -> Result<Signals, ModerationError> {
        let sentiment = self.sentiment.classify(message).await.map_err(|e| {
            warn!(error = %e, "Sentiment classifier failed");
            ModerationError::unavailable(Service::Sentiment, e)
        })?;

        let mut signals = Signals::lexical(message, sentiment, policy);

        if policy.needs_person_check() {
            signals.person_entities_present = self.person_entities_present(message).await?;
        }

        debug!(
            sentiment = sentiment.as_str(),
            tokens = signals.tokens.len(),
            cuss = signals.contains_cuss_word,
            blocked = signals.contains_blocked_word,
            community = signals.contains_community_term,
            person = signals.person_entities_present,
            "Extracted signals"
        );

        Ok(signals)
    }

    /// Whether the recognizer finds any person span in the message.
    pub async fn person_entities_present(&self, message: &str) -> Result<bool, ModerationError> {
        let spans = self.entities.recognize(message).await.map_err(|e| {
            warn!(error = %e, "Entity recognizer failed");
            ModerationError::unavailable(Service::EntityRecognition, e)
        })?;
        Ok(spans.iter().any(|s| s.is_person()))
    }
}
