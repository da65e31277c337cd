// Colored terminal output for verdicts and policies.

use colored::Colorize;

use crate::moderator::ModerationOutcome;
use crate::policy::guidelines::PHRASE_TABLE;
use crate::policy::PolicyConfig;

/// Print one moderation result, red when blocked and green when allowed.
pub fn display_outcome(outcome: &ModerationOutcome) {
    let line = if outcome.verdict.is_blocked() {
        outcome.result.red().bold()
    } else {
        outcome.result.green()
    };
    println!("{line}");
    println!("  {}", outcome_detail(outcome).dimmed());
}

/// The dimmed line under a verdict: the rule that fired, plus the block
/// reason when there is one.
fn outcome_detail(outcome: &ModerationOutcome) -> String {
    match outcome.verdict.block_reason() {
        Some(reason) => format!("rule: {:?}, reason: {}", outcome.rule, reason.as_str()),
        None => format!("rule: {:?}", outcome.rule),
    }
}

/// Print the switches and denylist parsed from a guidelines document.
pub fn display_policy(policy: &PolicyConfig) {
    println!("\n{}", "=== Parsed Policy ===".bold());
    println!();

    for (phrase, flag) in PHRASE_TABLE {
        let state = if policy.flag(flag) {
            "on ".green().bold()
        } else {
            "off".dimmed()
        };
        println!("  [{state}]  {:<26} \"{}\"", format!("{flag:?}"), phrase.dimmed());
    }

    println!();
    if policy.blocked_words.is_empty() {
        println!("  Blocked words: {}", "none".dimmed());
    } else {
        let words: Vec<&str> = policy.blocked_words.iter().map(String::as_str).collect();
        println!("  Blocked words: {}", words.join(", ").yellow());
    }

    if policy.is_permissive() {
        println!(
            "\n  {}",
            "No recognized phrases: every message falls through to a neutral allow.".dimmed()
        );
    }
    println!();
}

/// Print the totals at the end of a batch run.
pub fn display_batch_summary(total: usize, blocked: usize, failed: usize) {
    println!("\n{}", format!("=== Batch Summary ({total} messages) ===").bold());
    println!("  Allowed: {}", total.saturating_sub(blocked + failed).to_string().green());
    println!("  Blocked: {}", blocked.to_string().red());
    if failed > 0 {
        println!("  Failed:  {}", failed.to_string().yellow());
    }
}
