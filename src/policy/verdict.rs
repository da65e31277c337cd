// Verdicts and their display strings.
//
// The strings are a fixed contract with the caller: block verdicts carry no
// echoed message, allow verdicts append the original message verbatim.

use std::fmt;

use serde::Serialize;

/// Why a message was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    InappropriateLanguage,
    RestrictedWords,
    PersonalNames,
    CommunityTargeting,
}

impl BlockReason {
    /// Human-readable reason, without the trailing period.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::InappropriateLanguage => "Contains inappropriate language",
            BlockReason::RestrictedWords => "Contains restricted words",
            BlockReason::PersonalNames => "Contains personal names",
            BlockReason::CommunityTargeting => "Negative content targeting a community",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            BlockReason::InappropriateLanguage => "❌",
            _ => "🚫",
        }
    }
}

/// The outcome of evaluating one message against one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    Blocked { reason: BlockReason },
    AllowedPositive { message: String },
    AllowedNegativePersonal { message: String },
    AllowedNeutral { message: String },
}

impl Verdict {
    pub fn blocked(reason: BlockReason) -> Self {
        Verdict::Blocked { reason }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }

    pub fn block_reason(&self) -> Option<BlockReason> {
        match self {
            Verdict::Blocked { reason } => Some(*reason),
            _ => None,
        }
    }

    /// The display label before the echoed message, for allowed verdicts.
    fn allow_label(&self) -> Option<&'static str> {
        match self {
            Verdict::Blocked { .. } => None,
            Verdict::AllowedPositive { .. } => Some("✅ Allowed (Positive)"),
            Verdict::AllowedNegativePersonal { .. } => {
                Some("⚠️ Allowed (Negative - Personal Attack)")
            }
            Verdict::AllowedNeutral { .. } => Some("✅ Allowed (Neutral)"),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Blocked { reason } => {
                write!(f, "{} Message Blocked: {}.", reason.icon(), reason.as_str())
            }
            Verdict::AllowedPositive { message }
            | Verdict::AllowedNegativePersonal { message }
            | Verdict::AllowedNeutral { message } => {
                let label = self.allow_label().unwrap_or_default();
                write!(f, "{label}: {message}")
            }
        }
    }
}

/// Render a verdict into the caller-facing string.
pub fn format_verdict(verdict: &Verdict) -> String {
    verdict.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_strings() {
        assert_eq!(
            format_verdict(&Verdict::blocked(BlockReason::InappropriateLanguage)),
            "❌ Message Blocked: Contains inappropriate language."
        );
        assert_eq!(
            format_verdict(&Verdict::blocked(BlockReason::RestrictedWords)),
            "🚫 Message Blocked: Contains restricted words."
        );
        assert_eq!(
            format_verdict(&Verdict::blocked(BlockReason::PersonalNames)),
            "🚫 Message Blocked: Contains personal names."
        );
        assert_eq!(
            format_verdict(&Verdict::blocked(BlockReason::CommunityTargeting)),
            "🚫 Message Blocked: Negative content targeting a community."
        );
    }

    #[test]
    fn test_allow_strings_echo_message_verbatim() {
        let message = "  Spaced *and* punctuated!  ".to_string();
        assert_eq!(
            format_verdict(&Verdict::AllowedPositive {
                message: message.clone()
            }),
            format!("✅ Allowed (Positive): {message}")
        );
        assert_eq!(
            format_verdict(&Verdict::AllowedNegativePersonal {
                message: message.clone()
            }),
            format!("⚠️ Allowed (Negative - Personal Attack): {message}")
        );
        assert_eq!(
            format_verdict(&Verdict::AllowedNeutral { message: message.clone() }),
            format!("✅ Allowed (Neutral): {message}")
        );
    }

    #[test]
    fn test_format_is_idempotent() {
        let verdict = Verdict::AllowedNeutral {
            message: "hello".to_string(),
        };
        assert_eq!(format_verdict(&verdict), format_verdict(&verdict));
    }

    #[test]
    fn test_serializes_with_outcome_tag() {
        let json = serde_json::to_value(Verdict::blocked(BlockReason::PersonalNames)).unwrap();
        assert_eq!(json["outcome"], "blocked");
        assert_eq!(json["reason"], "personal_names");
    }
}
