use serde::Serialize;

use crate::failure::FailureKind;
use crate::orchestrator::CompletionReport;
use crate::router::{ExecutionType, RouteTarget};
use crate::task::{TaskId, TaskSummary};

/// 输出渲染器插件（控制输出格式）
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
    /// Called once when the driver stops, whatever the outcome.
    fn finish(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warn,
}

/// 渲染事件（统一事件类型）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    PlanCreated {
        session_id: String,
        requirement: String,
        rationale: Option<String>,
        tasks: Vec<TaskSummary>,
    },
    TaskStarted {
        task_id: TaskId,
        description: String,
        position: usize,
        total: usize,
    },
    TaskRouted {
        task_id: TaskId,
        execution_type: ExecutionType,
        target: RouteTarget,
        rationale: String,
    },
    TaskCompleted {
        task_id: TaskId,
        description: String,
        output: String,
        /// Failed attempts before this success, 0 for a clean run.
        recovered_after: u32,
    },
    TaskFailed {
        task_id: TaskId,
        description: String,
        kind: FailureKind,
        failure_count: u32,
        budget: u32,
        message: String,
    },
    RetryScheduled {
        task_id: TaskId,
        attempt: u32,
        delay_ms: u64,
    },
    TaskSkipped {
        task_id: TaskId,
        description: String,
        reason: String,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
    PlanCompleted {
        report: CompletionReport,
    },
    PlanAborted {
        session_id: String,
        task_id: TaskId,
    },
    PlanBlocked {
        session_id: String,
        waiting: Vec<TaskId>,
    },
}

impl RenderEvent {
    pub fn info(message: impl Into<String>) -> Self {
        RenderEvent::Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        RenderEvent::Notice {
            level: NoticeLevel::Warn,
            message: message.into(),
        }
    }
}

/// Renderer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl OutputRendererPlugin for NullRenderer {
    fn name(&self) -> &str {
        "null"
    }

    fn format(&self) -> &str {
        "none"
    }

    fn render(&self, _event: &RenderEvent) {}
}
