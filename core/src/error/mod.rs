#[allow(clippy::module_inception)]
pub mod error;
pub mod execution;
pub mod plan;

pub use error::CliError;
pub use execution::{CacheError, ExecutionError, PromptError};
pub use plan::PlanError;
