// Guideline parsing — prose moderation guidelines into a PolicyConfig.
//
// Admins write guidelines as free text. A fixed table of recognized phrases
// maps onto boolean policy switches; one directive (`block words: a, b, c`)
// declares a per-request denylist. Anything else in the text is ignored,
// so a document with no recognized phrases yields the most permissive policy.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Serialize;

/// The guideline document shown to admins when they haven't written their own.
pub const DEFAULT_GUIDELINES: &str = "
- Allow positive messages.
- Block cuss words.
- Allow negative comments about individuals but block negative comments against a community.
- Block personal names.
- Block hate speech or offensive language.
- Block messages containing threats, violence, or self-harm.
- Block excessive use of capital letters (potential shouting).
- Block messages with spam, links, or promotional content.
- Block messages with excessive special characters (potential spam).
- Allow constructive criticism but block harassment and bullying.
- Allow neutral discussions about sensitive topics but block inciting hate.
- Block messages with misleading or false information.
- Block messages containing phone numbers or personal addresses.
- Block messages with excessive repetition of words (spam behavior).
";

/// A boolean policy switch that a guideline phrase can turn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyFlag {
    AllowPositive,
    BlockCussWords,
    AllowNegativePersonal,
    BlockNegativeCommunity,
    BlockPersonalNames,
}

/// Recognized phrases, matched case-insensitively anywhere in the guidelines.
/// New phrases are added here, not as new branches in `parse`.
pub const PHRASE_TABLE: [(&str, PolicyFlag); 5] = [
    ("allow positive", PolicyFlag::AllowPositive),
    ("block cuss", PolicyFlag::BlockCussWords),
    (
        "allow negative comments about individuals",
        PolicyFlag::AllowNegativePersonal,
    ),
    (
        "block negative comments against a community",
        PolicyFlag::BlockNegativeCommunity,
    ),
    ("block personal names", PolicyFlag::BlockPersonalNames),
];

/// Structured policy derived from one guidelines document.
///
/// `Default` is the all-false, empty-denylist policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    /// Terms from the `block words:` directive, lowercased and trimmed.
    pub blocked_words: BTreeSet<String>,
    pub allow_positive: bool,
    pub block_cuss_words: bool,
    pub allow_negative_personal: bool,
    pub block_negative_community: bool,
    pub block_personal_names: bool,
}

impl PolicyConfig {
    /// Whether the given switch is on.
    pub fn flag(&self, flag: PolicyFlag) -> bool {
        match flag {
            PolicyFlag::AllowPositive => self.allow_positive,
            PolicyFlag::BlockCussWords => self.block_cuss_words,
            PolicyFlag::AllowNegativePersonal => self.allow_negative_personal,
            PolicyFlag::BlockNegativeCommunity => self.block_negative_community,
            PolicyFlag::BlockPersonalNames => self.block_personal_names,
        }
    }

    fn enable(&mut self, flag: PolicyFlag) {
        match flag {
            PolicyFlag::AllowPositive => self.allow_positive = true,
            PolicyFlag::BlockCussWords => self.block_cuss_words = true,
            PolicyFlag::AllowNegativePersonal => self.allow_negative_personal = true,
            PolicyFlag::BlockNegativeCommunity => self.block_negative_community = true,
            PolicyFlag::BlockPersonalNames => self.block_personal_names = true,
        }
    }

    /// True when no switch is on and the denylist is empty.
    pub fn is_permissive(&self) -> bool {
        self.blocked_words.is_empty() && PHRASE_TABLE.iter().all(|(_, f)| !self.flag(*f))
    }

    /// Whether evaluating this policy may need the entity recognizer.
    pub fn needs_person_check(&self) -> bool {
        self.block_personal_names
    }
}

/// Parse a guidelines document. Never fails.
pub fn parse(guidelines: &str) -> PolicyConfig {
    let lower = guidelines.to_lowercase();

    let mut config = PolicyConfig {
        blocked_words: extract_blocked_words(&lower),
        ..PolicyConfig::default()
    };

    for (phrase, flag) in PHRASE_TABLE {
        if lower.contains(phrase) {
            config.enable(flag);
        }
    }

    config
}

fn block_words_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"block words:\s*(.*)").expect("valid regex"))
}

/// Pull the denylist out of the first `block words:` line.
///
/// `.` stops at a newline, so only the remainder of that line is split.
fn extract_blocked_words(lower: &str) -> BTreeSet<String> {
    let Some(caps) = block_words_pattern().captures(lower) else {
        return BTreeSet::new();
    };

    caps.get(1)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
