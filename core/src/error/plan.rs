use thiserror::Error;

use super::execution::CacheError;
use crate::task::TransitionError;

/// Errors raised while building or driving a plan.
///
/// Construction errors (decomposition, graph validation) never leave a
/// partially built plan behind.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("decomposition failed: {0}")]
    DecompositionFailed(String),

    #[error("decomposition produced no subtasks")]
    EmptyDecomposition,

    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(u32),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("a plan is already active ({completed}/{total} tasks completed)")]
    PlanAlreadyActive { completed: usize, total: usize },

    #[error("no active plan")]
    NoActivePlan,

    #[error("no cached session found for '{0}'")]
    SessionNotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("context cache error: {0}")]
    Cache(#[from] CacheError),
}
