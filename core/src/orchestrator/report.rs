use std::fmt;

use serde::Serialize;

use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTask {
    pub id: TaskId,
    pub description: String,
    pub reason: String,
}

/// Final tally of a plan whose tasks are all resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub session_id: String,
    pub requirement: String,
    pub total: usize,
    pub completed: usize,
    pub skipped: Vec<SkippedTask>,
}

impl CompletionReport {
    pub fn all_completed(&self) -> bool {
        self.skipped.is_empty() && self.completed == self.total
    }
}

impl fmt::Display for CompletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Execution Summary ===")?;
        writeln!(f, "Completed: {}/{}", self.completed, self.total)?;
        if self.skipped.is_empty() {
            return write!(f, "All tasks executed successfully");
        }
        writeln!(f, "Skipped: {}", self.skipped.len())?;
        writeln!(f, "Skipped tasks and reasons:")?;
        for (i, task) in self.skipped.iter().enumerate() {
            write!(f, "  - Task {} ({}): {}", task.id, task.description, task.reason)?;
            if i + 1 < self.skipped.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// How a driven plan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(CompletionReport),
    /// Operator chose to abort; the plan is gone.
    Aborted { session_id: String, task_id: TaskId },
    /// Remaining tasks wait on dependencies that can no longer complete; the
    /// plan stays active.
    Blocked {
        session_id: String,
        waiting: Vec<TaskId>,
    },
}

/// Result of one orchestrator step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// One task was resolved and more remain.
    Continue,
    Done(RunOutcome),
}
