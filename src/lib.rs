// Moderator: guideline-driven message moderation
//
// This is the library root. Each module corresponds to one stage of the
// moderation pipeline: guidelines are parsed into a policy, classifiers and
// lexical analyzers produce signals, and an ordered rule cascade turns the
// two into a verdict.

pub mod classify;
pub mod config;
pub mod error;
pub mod moderator;
pub mod output;
pub mod policy;
pub mod signals;

#[cfg(feature = "web")]
pub mod web;

pub use error::ModerationError;
pub use moderator::{ModerationOutcome, ModerationRequest, Moderator};
