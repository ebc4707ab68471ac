use std::collections::BTreeMap;

use async_trait::async_trait;
use plancraft_core::api::{CommandExecutorConfig, ExecutionError, TaskExecutor};

use super::process::{into_result, run_shell};
use super::template::render_template;

/// Runs each route target through a configured shell command template.
///
/// Role commands receive the execution context on stdin; tools and commands
/// get no input.
pub struct CommandTaskExecutor {
    cfg: CommandExecutorConfig,
}

impl CommandTaskExecutor {
    pub fn new(cfg: CommandExecutorConfig) -> Self {
        Self { cfg }
    }

    async fn run(
        &self,
        kind: &str,
        templates: &BTreeMap<String, String>,
        target: &str,
        description: &str,
        stdin: Option<&str>,
    ) -> Result<String, ExecutionError> {
        let template = templates.get(target).ok_or_else(|| {
            ExecutionError::Unsupported(format!("no command configured for {kind} `{target}`"))
        })?;
        let line = render_template(template, target, description);
        tracing::info!(kind, target, "executing task command");
        let out = run_shell(&line, stdin, self.cfg.timeout_ms).await?;
        into_result(target, out)
    }
}

#[async_trait]
impl TaskExecutor for CommandTaskExecutor {
    fn name(&self) -> &str {
        "command"
    }

    async fn execute_role(
        &self,
        role: &str,
        description: &str,
        context: &str,
    ) -> Result<String, ExecutionError> {
        self.run("role", &self.cfg.roles, role, description, Some(context))
            .await
    }

    async fn execute_local_tool(
        &self,
        tool: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        self.run("tool", &self.cfg.tools, tool, description, None).await
    }

    async fn execute_remote_tool(
        &self,
        tool: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        self.run("remote tool", &self.cfg.remote_tools, tool, description, None)
            .await
    }

    async fn execute_command(
        &self,
        command: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        self.run("command", &self.cfg.commands, command, description, None)
            .await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor() -> CommandTaskExecutor {
        let mut cfg = CommandExecutorConfig {
            timeout_ms: 5_000,
            ..CommandExecutorConfig::default()
        };
        cfg.roles
            .insert("coder".into(), "printf '%s|' {role} {description}; cat".into());
        cfg.tools
            .insert("compile".into(), "echo 'error: invalid syntax' >&2; exit 1".into());
        CommandTaskExecutor::new(cfg)
    }

    #[tokio::test]
    async fn test_role_gets_context_on_stdin() {
        let out = executor()
            .execute_role("coder", "write lexer", "## Context")
            .await
            .unwrap();
        assert_eq!(out, "coder|write lexer|## Context");
    }

    #[tokio::test]
    async fn test_failing_tool_reports_stderr() {
        let err = executor()
            .execute_local_tool("compile", "build")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("error: invalid syntax"));
    }

    #[tokio::test]
    async fn test_unconfigured_target_is_unsupported() {
        let err = executor().execute_command("/review", "x").await.unwrap_err();
        assert!(matches!(err, ExecutionError::Unsupported(_)));
    }
}
