use anyhow::Context;
use async_trait::async_trait;
use plancraft_core::api::{CommandDecomposerConfig, Decomposer, Decomposition};

use super::parse::parse_decomposition;
use crate::backend::process::{into_result, run_program};

/// Runs an external planner with the requirement on stdin.
pub struct CommandDecomposer {
    cfg: CommandDecomposerConfig,
}

impl CommandDecomposer {
    pub fn new(cfg: CommandDecomposerConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl Decomposer for CommandDecomposer {
    fn name(&self) -> &str {
        "command"
    }

    async fn decompose(&self, requirement: &str) -> anyhow::Result<Decomposition> {
        let program = self.cfg.program.as_str();
        tracing::info!(program, "running planner");
        let out = run_program(program, &self.cfg.args, Some(requirement), self.cfg.timeout_ms)
            .await
            .with_context(|| format!("planner `{program}` could not run"))?;
        let text = into_result(program, out).with_context(|| format!("planner `{program}` failed"))?;
        parse_decomposition(&text).with_context(|| format!("planner `{program}` output"))
    }
}
