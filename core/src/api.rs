//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `plancraft_core::api` instead of reaching into internal modules.

pub use crate::backend::{dispatch, Decomposer, Decomposition, TaskExecutor};
pub use crate::config::{
    load_default, AppConfig, BuiltinDecomposerConfig, CacheConfig, CommandDecomposerConfig,
    CommandExecutorConfig, DecomposerProvider, ExecutorProvider, LoggingConfig, OutputConfig,
    PlanFileDecomposerConfig, PromptConfig, RetryConfig,
};
pub use crate::context::{
    CacheStats, ContextSnapshot, ContextStore, ExecutionContext, MemoryContextStore,
    TaskContextCache, TaskResultRecord,
};
pub use crate::error::{CacheError, CliError, ExecutionError, PlanError, PromptError};
pub use crate::failure::{
    BackoffStrategyPlugin, ErrorClassifier, FailureKind, FixedBackoff, RetryPolicy,
};
pub use crate::graph::{DependencyResolver, GraphStats};
pub use crate::interactive::{
    FailureDecision, FailureHandler, OperatorPrompt, ScriptedPrompt, DECISION_OPTIONS,
};
pub use crate::orchestrator::{
    CompletionReport, PlanSession, RunOutcome, SkippedTask, StepOutcome, TodoListManager,
};
pub use crate::render::{NoticeLevel, NullRenderer, OutputRendererPlugin, RenderEvent};
pub use crate::router::{ExecutionType, RouteDecision, RoutePlan, RouteTarget, TaskRouter};
pub use crate::services::{AppContext, Services, ServicesFactory};
pub use crate::task::{SubtaskSpec, Task, TaskId, TaskList, TaskStatus, TaskSummary};
