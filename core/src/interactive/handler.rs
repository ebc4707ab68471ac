use std::sync::Arc;

use serde::Serialize;

use super::prompt::OperatorPrompt;
use crate::error::PromptError;
use crate::failure::{ErrorClassifier, FailureKind};
use crate::render::{OutputRendererPlugin, RenderEvent};
use crate::task::Task;

/// Operator (or automatic) verdict on a failed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureDecision {
    RetryOnce,
    SkipTask,
    AbortPlan,
}

impl FailureDecision {
    pub fn label(self) -> &'static str {
        match self {
            FailureDecision::RetryOnce => "retry once",
            FailureDecision::SkipTask => "skip task",
            FailureDecision::AbortPlan => "abort plan",
        }
    }
}

pub const DECISION_OPTIONS: [&str; 3] = [
    "Retry once more",
    "Skip this task and continue",
    "Abort entire plan",
];

/// Decides what happens after a failure the retry policy did not absorb.
pub struct FailureHandler {
    classifier: ErrorClassifier,
    prompt: Arc<dyn OperatorPrompt>,
    renderer: Arc<dyn OutputRendererPlugin>,
}

impl FailureHandler {
    pub fn new(
        classifier: ErrorClassifier,
        prompt: Arc<dyn OperatorPrompt>,
        renderer: Arc<dyn OutputRendererPlugin>,
    ) -> Self {
        Self {
            classifier,
            prompt,
            renderer,
        }
    }

    /// A permanent error on the first attempt is skipped without asking; an
    /// exhausted budget goes to the operator; anything else retries.
    pub async fn handle_failure(
        &self,
        task: &Task,
        message: &str,
        failure_count: u32,
    ) -> Result<FailureDecision, PromptError> {
        let kind = self.classifier.classify(message);
        let budget = self.classifier.max_retries(kind);

        if kind == FailureKind::Permanent && failure_count == 1 {
            self.renderer
                .render(&RenderEvent::warn("This is a permanent error. Skipping task..."));
            return Ok(FailureDecision::SkipTask);
        }

        if failure_count >= budget {
            return self.ask_operator(task).await;
        }

        self.renderer.render(&RenderEvent::info(format!(
            "Retrying... (attempt {} of {})",
            failure_count + 1,
            budget
        )));
        Ok(FailureDecision::RetryOnce)
    }

    async fn ask_operator(&self, task: &Task) -> Result<FailureDecision, PromptError> {
        let title = format!("Task {} has failed after multiple retries.", task.id);
        tracing::info!(task_id = task.id, "waiting for operator decision");

        loop {
            let input = self.prompt.choose(&title, &DECISION_OPTIONS).await?;
            match parse_choice(&input) {
                Some(decision) => {
                    tracing::info!(task_id = task.id, ?decision, "operator decided");
                    return Ok(decision);
                }
                None => self
                    .renderer
                    .render(&RenderEvent::warn("Invalid choice. Please enter 1, 2, or 3.")),
            }
        }
    }
}

fn parse_choice(input: &str) -> Option<FailureDecision> {
    match input.trim() {
        "1" => Some(FailureDecision::RetryOnce),
        "2" => Some(FailureDecision::SkipTask),
        "3" => Some(FailureDecision::AbortPlan),
        _ => None,
    }
}
