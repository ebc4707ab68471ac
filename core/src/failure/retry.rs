use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use super::backoff::{BackoffStrategyPlugin, FixedBackoff};
use super::classifier::ErrorClassifier;
use crate::task::TaskId;

/// Per-task retry counters, failure reasons and skip flags for one plan.
pub struct RetryPolicy {
    classifier: ErrorClassifier,
    backoff: Arc<dyn BackoffStrategyPlugin>,
    retry_counts: HashMap<TaskId, u32>,
    failure_reasons: BTreeMap<TaskId, String>,
    skipped: BTreeSet<TaskId>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(ErrorClassifier::default(), Arc::new(FixedBackoff::default()))
    }
}

impl RetryPolicy {
    pub fn new(classifier: ErrorClassifier, backoff: Arc<dyn BackoffStrategyPlugin>) -> Self {
        Self {
            classifier,
            backoff,
            retry_counts: HashMap::new(),
            failure_reasons: BTreeMap::new(),
            skipped: BTreeSet::new(),
        }
    }

    /// Record a failure; `true` means another automatic attempt is allowed.
    ///
    /// Once the counter reaches the budget of the failure class, the task is
    /// marked skipped and `false` is returned.
    pub fn record_failure(&mut self, task_id: TaskId, reason: &str) -> bool {
        let current = self.retry_count(task_id);
        let budget = self.classifier.budget_for(reason);
        tracing::warn!(
            task_id,
            attempt = current + 1,
            reason = ErrorClassifier::describe(reason),
            "task execution failed"
        );

        self.failure_reasons.insert(task_id, reason.to_string());

        if current < budget {
            self.retry_counts.insert(task_id, current + 1);
            true
        } else {
            self.skipped.insert(task_id);
            tracing::warn!(task_id, budget, "retry budget exhausted, task marked skipped");
            false
        }
    }

    pub fn record_success(&mut self, task_id: TaskId) {
        self.retry_counts.remove(&task_id);
        self.failure_reasons.remove(&task_id);
        tracing::debug!(task_id, "retry state cleared after success");
    }

    /// Backoff delay before the next attempt of `task_id`.
    pub fn next_delay(&self, task_id: TaskId) -> Duration {
        let attempt = self.retry_count(task_id).saturating_sub(1);
        self.backoff.next_delay(attempt)
    }

    /// Sleep for the backoff delay before the next attempt of `task_id`.
    pub async fn wait_before_retry(&self, task_id: TaskId) {
        let delay = self.next_delay(task_id);
        if delay.is_zero() {
            return;
        }
        tracing::info!(
            task_id,
            delay_ms = delay.as_millis() as u64,
            strategy = self.backoff.name(),
            "waiting before retry"
        );
        tokio::time::sleep(delay).await;
    }

    pub fn is_skipped(&self, task_id: TaskId) -> bool {
        self.skipped.contains(&task_id)
    }

    /// Skip requested outside the retry budget (operator or dependency check).
    pub fn mark_skipped(&mut self, task_id: TaskId, reason: impl Into<String>) {
        self.failure_reasons.insert(task_id, reason.into());
        self.skipped.insert(task_id);
    }

    /// Give one attempt back and lift the skip flag (operator chose retry once).
    pub fn grant_grace(&mut self, task_id: TaskId) {
        if let Some(count) = self.retry_counts.get_mut(&task_id) {
            *count = count.saturating_sub(1);
        }
        self.skipped.remove(&task_id);
    }

    pub fn failure_reason(&self, task_id: TaskId) -> &str {
        self.failure_reasons
            .get(&task_id)
            .map(String::as_str)
            .unwrap_or("Unknown reason")
    }

    pub fn retry_count(&self, task_id: TaskId) -> u32 {
        self.retry_counts.get(&task_id).copied().unwrap_or(0)
    }

    /// Skipped task ids in ascending order.
    pub fn skipped_tasks(&self) -> Vec<TaskId> {
        self.skipped.iter().copied().collect()
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    pub fn reset(&mut self) {
        self.retry_counts.clear();
        self.failure_reasons.clear();
        self.skipped.clear();
        tracing::debug!("retry state reset");
    }

    pub fn summary(&self) -> String {
        if self.skipped.is_empty() && self.failure_reasons.is_empty() {
            return "All tasks executed successfully".to_string();
        }

        let mut out = String::new();
        if !self.skipped.is_empty() {
            let ids: Vec<String> = self.skipped.iter().map(|id| id.to_string()).collect();
            out.push_str("Skipped tasks: ");
            out.push_str(&ids.join(", "));
            out.push('\n');
        }
        if !self.failure_reasons.is_empty() {
            out.push_str("Failure reasons:\n");
            for (id, reason) in &self.failure_reasons {
                out.push_str(&format!("  - Task {id}: {reason}\n"));
            }
        }
        out
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("classifier", &self.classifier)
            .field("backoff", &self.backoff.name())
            .field("retry_counts", &self.retry_counts)
            .field("skipped", &self.skipped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(ErrorClassifier::default(), Arc::new(FixedBackoff::from_millis(0)))
    }

    #[test]
    fn test_transient_budget() {
        let mut p = policy();
        assert!(p.record_failure(1, "connection timeout"));
        assert!(p.record_failure(1, "connection timeout"));
        assert!(p.record_failure(1, "connection timeout"));
        assert_eq!(p.retry_count(1), 3);
        assert!(!p.record_failure(1, "connection timeout"));
        assert!(p.is_skipped(1));
    }

    #[test]
    fn test_permanent_fails_immediately() {
        let mut p = policy();
        assert!(!p.record_failure(2, "404 resource not found"));
        assert!(p.is_skipped(2));
        assert_eq!(p.failure_reason(2), "404 resource not found");
    }

    #[test]
    fn test_success_behaves_like_fresh_task() {
        let mut p = policy();
        p.record_failure(1, "timeout");
        p.record_failure(1, "timeout");
        p.record_success(1);
        assert_eq!(p.retry_count(1), 0);
        assert_eq!(p.failure_reason(1), "Unknown reason");

        assert!(p.record_failure(1, "timeout"));
        assert_eq!(p.retry_count(1), 1);
    }

    #[test]
    fn test_permanent_after_success_matches_fresh_task() {
        let mut fresh = policy();
        let fresh_retry = fresh.record_failure(5, "404 resource not found");

        let mut p = policy();
        p.record_failure(5, "timeout");
        p.record_success(5);
        let retry = p.record_failure(5, "404 resource not found");

        assert!(!retry);
        assert_eq!(retry, fresh_retry);
        assert!(p.is_skipped(5));
        assert_eq!(p.is_skipped(5), fresh.is_skipped(5));
        assert_eq!(p.retry_count(5), fresh.retry_count(5));
        assert_eq!(p.failure_reason(5), fresh.failure_reason(5));
    }

    #[test]
    fn test_grace_lifts_skip() {
        let mut p = policy();
        for _ in 0..4 {
            p.record_failure(3, "503");
        }
        assert!(p.is_skipped(3));

        p.grant_grace(3);
        assert!(!p.is_skipped(3));
        assert_eq!(p.retry_count(3), 2);
        assert!(p.record_failure(3, "503"));
    }

    #[test]
    fn test_summary() {
        let mut p = policy();
        assert_eq!(p.summary(), "All tasks executed successfully");

        p.mark_skipped(4, "operator skipped");
        p.record_failure(2, "invalid input");
        assert_eq!(p.skipped_tasks(), vec![2, 4]);
        assert_eq!(
            p.summary(),
            "Skipped tasks: 2, 4\nFailure reasons:\n  - Task 2: invalid input\n  - Task 4: operator skipped\n"
        );

        p.reset();
        assert!(p.skipped_tasks().is_empty());
    }

    #[tokio::test]
    async fn test_zero_delay_returns_immediately() {
        let mut p = policy();
        p.record_failure(1, "timeout");
        p.wait_before_retry(1).await;
    }
}
