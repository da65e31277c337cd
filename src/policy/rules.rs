// Policy evaluation — an ordered cascade of rules.
//
// Each rule is a pure function of (policy, signals, message) that either
// claims the message with a verdict or passes. The first rule that claims
// wins. The order of RULES is the priority contract: a message that trips
// several rules always gets the verdict of the earliest one.

use serde::Serialize;

use super::guidelines::PolicyConfig;
use super::verdict::{BlockReason, Verdict};
use crate::classify::traits::Sentiment;
use crate::signals::Signals;

/// Identifies which rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    CussWords,
    RestrictedWords,
    PersonalNames,
    PositiveAllow,
    NegativeCommunity,
    NegativePersonal,
    /// No rule claimed the message.
    Default,
}

pub type RuleFn = fn(&PolicyConfig, &Signals, &str) -> Option<Verdict>;

/// Rules in priority order. `RuleId::Default` is not listed: it applies
/// when every rule here passes.
pub const RULES: [(RuleId, RuleFn); 6] = [
    (RuleId::CussWords, cuss_words),
    (RuleId::RestrictedWords, restricted_words),
    (RuleId::PersonalNames, personal_names),
    (RuleId::PositiveAllow, positive_allow),
    (RuleId::NegativeCommunity, negative_community),
    (RuleId::NegativePersonal, negative_personal),
];

/// A verdict together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub rule: RuleId,
    pub verdict: Verdict,
}

/// Evaluate a message. Total: always returns exactly one verdict.
pub fn evaluate(config: &PolicyConfig, signals: &Signals, message: &str) -> Verdict {
    evaluate_traced(config, signals, message).verdict
}

/// Like `evaluate`, but also reports which rule fired.
pub fn evaluate_traced(config: &PolicyConfig, signals: &Signals, message: &str) -> Evaluation {
    RULES
        .iter()
        .find_map(|(id, rule)| {
            rule(config, signals, message).map(|verdict| Evaluation { rule: *id, verdict })
        })
        .unwrap_or_else(|| Evaluation {
            rule: RuleId::Default,
            verdict: Verdict::AllowedNeutral {
                message: message.to_string(),
            },
        })
}

pub fn cuss_words(config: &PolicyConfig, signals: &Signals, _message: &str) -> Option<Verdict> {
    (config.block_cuss_words && signals.contains_cuss_word)
        .then(|| Verdict::blocked(BlockReason::InappropriateLanguage))
}

/// Applies whenever the denylist matches, regardless of any switch.
pub fn restricted_words(_config: &PolicyConfig, signals: &Signals, _message: &str) -> Option<Verdict> {
    signals
        .contains_blocked_word
        .then(|| Verdict::blocked(BlockReason::RestrictedWords))
}

pub fn personal_names(config: &PolicyConfig, signals: &Signals, _message: &str) -> Option<Verdict> {
    (config.block_personal_names && signals.person_entities_present)
        .then(|| Verdict::blocked(BlockReason::PersonalNames))
}

pub fn positive_allow(config: &PolicyConfig, signals: &Signals, message: &str) -> Option<Verdict> {
    (signals.sentiment == Sentiment::Positive && config.allow_positive).then(|| {
        Verdict::AllowedPositive {
            message: message.to_string(),
        }
    })
}

pub fn negative_community(
    config: &PolicyConfig,
    signals: &Signals,
    _message: &str,
) -> Option<Verdict> {
    (signals.sentiment == Sentiment::Negative
        && signals.contains_community_term
        && config.block_negative_community)
        .then(|| Verdict::blocked(BlockReason::CommunityTargeting))
}

/// A negative message with neither this switch nor a community match falls
/// through to the neutral default rather than being flagged.
pub fn negative_personal(
    config: &PolicyConfig,
    signals: &Signals,
    message: &str,
) -> Option<Verdict> {
    (signals.sentiment == Sentiment::Negative && config.allow_negative_personal).then(|| {
        Verdict::AllowedNegativePersonal {
            message: message.to_string(),
        }
    })
}
