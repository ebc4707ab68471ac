use async_trait::async_trait;
use plancraft_core::api::{ExecutionError, TaskExecutor};

/// Dry-run executor: every task succeeds with a line saying what would run.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoTaskExecutor;

#[async_trait]
impl TaskExecutor for EchoTaskExecutor {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute_role(
        &self,
        role: &str,
        description: &str,
        context: &str,
    ) -> Result<String, ExecutionError> {
        Ok(format!(
            "[dry-run] role {role}: {description} ({} bytes of context)",
            context.len()
        ))
    }

    async fn execute_local_tool(
        &self,
        tool: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        Ok(format!("[dry-run] tool {tool}: {description}"))
    }

    async fn execute_remote_tool(
        &self,
        tool: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        Ok(format!("[dry-run] mcp {tool}: {description}"))
    }

    async fn execute_command(
        &self,
        command: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        Ok(format!("[dry-run] command {command}: {description}"))
    }
}
