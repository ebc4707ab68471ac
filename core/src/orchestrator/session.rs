use crate::context::ExecutionContext;
use crate::failure::RetryPolicy;
use crate::orchestrator::report::{CompletionReport, SkippedTask};
use crate::task::{TaskId, TaskList};

/// The active plan: its task list, retry bookkeeping and execution context.
///
/// Owned by exactly one orchestrator; dropping it discards the plan.
#[derive(Debug)]
pub struct PlanSession {
    pub list: TaskList,
    pub retry: RetryPolicy,
    pub context: ExecutionContext,
}

impl PlanSession {
    pub fn new(list: TaskList, retry: RetryPolicy, context: ExecutionContext) -> Self {
        Self {
            list,
            retry,
            context,
        }
    }

    pub fn session_id(&self) -> &str {
        self.context.session_id()
    }

    /// Ids of the tasks not yet resolved, in execution order.
    pub fn unresolved(&self) -> Vec<TaskId> {
        self.list.tasks()[self.list.cursor().min(self.list.total_count())..]
            .iter()
            .filter(|t| !t.is_resolved())
            .map(|t| t.id)
            .collect()
    }

    pub fn completion_report(&self) -> CompletionReport {
        CompletionReport {
            session_id: self.session_id().to_string(),
            requirement: self.list.requirement().to_string(),
            total: self.list.total_count(),
            completed: self.list.completed_count(),
            skipped: self
                .list
                .skipped_tasks()
                .into_iter()
                .map(|t| SkippedTask {
                    id: t.id,
                    description: t.description.clone(),
                    reason: self.retry.failure_reason(t.id).to_string(),
                })
                .collect(),
        }
    }
}
