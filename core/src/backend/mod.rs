use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::router::RouteTarget;
use crate::task::SubtaskSpec;

/// Output of a decomposition service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    #[serde(default, alias = "tasks")]
    pub subtasks: Vec<SubtaskSpec>,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Turns a requirement into an ordered list of subtasks.
///
/// A failed call is an error; an empty `subtasks` list is a valid answer the
/// orchestrator rejects on its own.
#[async_trait::async_trait]
pub trait Decomposer: Send + Sync {
    fn name(&self) -> &str;

    async fn decompose(&self, requirement: &str) -> Result<Decomposition>;
}

/// Executes one routed task.
///
/// The `Display` form of a returned error is what the failure classifier sees.
#[async_trait::async_trait]
pub trait TaskExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn execute_role(
        &self,
        role: &str,
        description: &str,
        context: &str,
    ) -> Result<String, ExecutionError>;

    async fn execute_local_tool(&self, tool: &str, description: &str)
        -> Result<String, ExecutionError>;

    async fn execute_remote_tool(
        &self,
        tool: &str,
        description: &str,
    ) -> Result<String, ExecutionError>;

    async fn execute_command(&self, command: &str, description: &str)
        -> Result<String, ExecutionError>;
}

/// Call the executor entry point matching `target`.
pub async fn dispatch(
    executor: &dyn TaskExecutor,
    target: &RouteTarget,
    description: &str,
    context: &str,
) -> Result<String, ExecutionError> {
    match target {
        RouteTarget::Role(role) => executor.execute_role(role, description, context).await,
        RouteTarget::LocalTool(tool) => executor.execute_local_tool(tool, description).await,
        RouteTarget::RemoteTool(tool) => executor.execute_remote_tool(tool, description).await,
        RouteTarget::Command(cmd) => executor.execute_command(cmd, description).await,
    }
}
