//! The todo-list orchestrator: plan creation, the sequential step loop and
//! the queries around the active plan.

pub mod manager;
pub mod report;
pub mod session;

pub use manager::TodoListManager;
pub use report::{CompletionReport, RunOutcome, SkippedTask, StepOutcome};
pub use session::PlanSession;
