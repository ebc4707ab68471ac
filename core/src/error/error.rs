use thiserror::Error;

use super::plan::PlanError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("plan failed: {0}")]
    Plan(#[from] PlanError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("plan aborted by operator at task {task_id}")]
    Aborted { task_id: u32 },
    #[error("plan blocked: tasks {waiting:?} wait on dependencies that cannot complete")]
    Blocked { waiting: Vec<u32> },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// 0: success
    /// 11: config error
    /// 12: plan construction (decomposition / dependency graph)
    /// 13: aborted by the operator
    /// 14: blocked on unsatisfiable dependencies
    /// 20: io / command error
    /// 50: internal/uncategorized
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 11,
            CliError::Plan(pe) => match pe {
                PlanError::DecompositionFailed(_)
                | PlanError::EmptyDecomposition
                | PlanError::DuplicateTaskId(_)
                | PlanError::CircularDependency(_) => 12,
                PlanError::PlanAlreadyActive { .. } | PlanError::NoActivePlan => 12,
                PlanError::SessionNotFound(_) => 11,
                PlanError::Transition(_) | PlanError::Cache(_) => 50,
            },
            CliError::Aborted { .. } => 13,
            CliError::Blocked { .. } => 14,
            CliError::Io(_) | CliError::Command(_) => 20,
            CliError::Anyhow(_) => 50,
        }
    }
}
