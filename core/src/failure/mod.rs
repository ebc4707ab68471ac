//! Failure taxonomy and retry bookkeeping.
//!
//! [`ErrorClassifier`] turns a backend error message into a [`FailureKind`]
//! with a retry budget; [`RetryPolicy`] tracks per-task attempts and decides
//! between another automatic attempt and escalation.

pub mod backoff;
pub mod classifier;
pub mod retry;

pub use backoff::{BackoffStrategyPlugin, FixedBackoff};
pub use classifier::{ErrorClassifier, FailureKind};
pub use retry::RetryPolicy;
