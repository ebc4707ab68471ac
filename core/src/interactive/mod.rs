//! Operator escalation when automatic retries run out.

pub mod handler;
pub mod prompt;

pub use handler::{FailureDecision, FailureHandler, DECISION_OPTIONS};
pub use prompt::{OperatorPrompt, ScriptedPrompt};
