//! Task data model: a single [`Task`], its status rules, and the
//! cursor-tracked [`TaskList`] derived from one requirement.

pub mod list;
pub mod transitions;
pub mod types;

pub use list::TaskList;
pub use transitions::{TaskTransition, TransitionError};
pub use types::{SubtaskSpec, Task, TaskId, TaskStatus, TaskSummary};
