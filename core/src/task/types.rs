use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transitions::{TaskTransition, TransitionError};

/// Task identity, unique within one list and assigned from 1 in plan order.
pub type TaskId = u32;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl TaskStatus {
    pub fn marker(self) -> &'static str {
        match self {
            TaskStatus::Pending => "[ ]",
            TaskStatus::InProgress => "[>]",
            TaskStatus::Completed => "[x]",
            TaskStatus::Skipped => "[-]",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// One subtask as returned by a decomposer, before ids are assigned.
///
/// `depends_on` refers to 1-based positions in the decomposition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskSpec {
    pub description: String,
    #[serde(default)]
    pub depends_on: Vec<TaskId>,
}

impl SubtaskSpec {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on(mut self, deps: impl IntoIterator<Item = TaskId>) -> Self {
        self.depends_on = deps.into_iter().collect();
        self
    }
}

/// A single unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    pub created_at: DateTime<Utc>,

    status: TaskStatus,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    failure_count: u32,
    #[serde(default)]
    last_error: Option<String>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: TaskId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            dependencies: Vec::new(),
            created_at: Utc::now(),
            status: TaskStatus::Pending,
            output: None,
            failure_count: 0,
            last_error: None,
            completed_at: None,
        }
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Output text; only present once the task is completed.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == TaskStatus::InProgress
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == TaskStatus::Skipped
    }

    /// Completed or skipped.
    pub fn is_resolved(&self) -> bool {
        TaskTransition::is_terminal(self.status)
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition_to(TaskStatus::InProgress)
    }

    pub fn complete(&mut self, output: impl Into<String>) -> Result<(), TransitionError> {
        self.transition_to(TaskStatus::Completed)?;
        self.output = Some(output.into());
        self.completed_at = Some(Utc::now());
        self.failure_count = 0;
        Ok(())
    }

    pub fn skip(&mut self) -> Result<(), TransitionError> {
        self.transition_to(TaskStatus::Skipped)
    }

    fn transition_to(&mut self, to: TaskStatus) -> Result<(), TransitionError> {
        TaskTransition::validate(self.id, self.status, to)?;
        self.status = to;
        Ok(())
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a failed attempt and return the new failure count.
    pub fn record_failure(&mut self, message: impl Into<String>) -> u32 {
        self.last_error = Some(message.into());
        self.failure_count += 1;
        self.failure_count
    }

    /// One extra attempt granted by the operator: give back one failure.
    pub fn grant_grace(&mut self) {
        self.failure_count = self.failure_count.saturating_sub(1);
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            description: self.description.clone(),
            status: self.status,
            dependencies: self.dependencies.clone(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Task {}: {}",
            self.status.marker(),
            self.id,
            self.description
        )
    }
}

/// Lightweight, renderer-facing view of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub description: String,
    pub status: TaskStatus,
    pub dependencies: Vec<TaskId>,
}
