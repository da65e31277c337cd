// Lexical analyzers — tokens, cuss words, community terms.

use std::collections::BTreeSet;

/// Static cuss list. Multi-word entries can never equal a single token and
/// so never match; they are kept so the list reads as written.
pub const CUSS_WORDS: &[&str] = &[
    "damn", "hell", "shit", "fuck", "ass", "bastard", "bitch", "bollocks", "bugger",
    "bullshit", "crap", "dammit", "douche", "dumbass", "faggot", "jackass", "jerk",
    "motherfucker", "piss", "prick", "slut", "son of a bitch", "twat", "wanker",
];

/// Inflectional endings under which a cuss word still counts
/// ("fucking", "damned", "jerks"). Any other continuation is a different word.
pub const CUSS_SUFFIXES: &[&str] = &["s", "es", "ed", "er", "ers", "ing"];

/// Endings that may follow a doubled final consonant ("shitting", "crapped").
pub const DOUBLING_SUFFIXES: &[&str] = &["ed", "er", "ers", "ing"];

/// Terms that refer to a group of people. Matched as substrings so plural
/// and possessive forms ("groups", "community's") still count.
pub const COMMUNITY_TERMS: &[&str] = &[
    "religion",
    "race",
    "ethnicity",
    "group",
    "community",
    "gender",
];

/// Lowercased maximal runs of word characters (alphanumeric or `_`).
pub fn tokenize(message: &str) -> BTreeSet<String> {
    message
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a single token is a listed cuss word or an inflection of one.
pub fn is_cuss_word(token: &str) -> bool {
    CUSS_WORDS.iter().any(|word| {
        token
            .strip_prefix(word)
            .is_some_and(|rest| rest.is_empty() || is_inflection(word, rest))
    })
}

fn is_inflection(word: &str, rest: &str) -> bool {
    if CUSS_SUFFIXES.contains(&rest) {
        return true;
    }
    let Some(last) = word.chars().last() else {
        return false;
    };
    rest.strip_prefix(last)
        .is_some_and(|ending| DOUBLING_SUFFIXES.contains(&ending))
}

pub fn contains_cuss_word(tokens: &BTreeSet<String>) -> bool {
    tokens.iter().any(|t| is_cuss_word(t))
}

pub fn contains_blocked_word(tokens: &BTreeSet<String>, blocked: &BTreeSet<String>) -> bool {
    // Iterate the smaller side
    if blocked.len() < tokens.len() {
        blocked.iter().any(|w| tokens.contains(w))
    } else {
        tokens.iter().any(|t| blocked.contains(t))
    }
}

pub fn contains_community_term(message: &str) -> bool {
    let lower = message.to_lowercase();
    COMMUNITY_TERMS.iter().any(|term| lower.contains(term))
}
