//! Session-scoped context: the key/value store seam, the cache layered on
//! top of it, and the per-plan execution context.

pub mod cache;
pub mod execution;
pub mod store;

pub use cache::{CacheStats, TaskContextCache, TaskResultRecord};
pub use execution::{ContextSnapshot, ExecutionContext};
pub use store::{ContextStore, MemoryContextStore};
