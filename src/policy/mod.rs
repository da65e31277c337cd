// Policy engine — guideline parsing, rule evaluation, verdict formatting.

pub mod guidelines;
pub mod rules;
pub mod verdict;

pub use guidelines::{parse, PolicyConfig, PolicyFlag, DEFAULT_GUIDELINES};
pub use rules::{evaluate, evaluate_traced, Evaluation, RuleId};
pub use verdict::{format_verdict, BlockReason, Verdict};
