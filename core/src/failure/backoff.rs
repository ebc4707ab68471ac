use std::time::Duration;

/// Delay schedule between automatic retries of one task.
///
/// `attempt` is the number of retries already granted (0 before the first).
pub trait BackoffStrategyPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn next_delay(&self, attempt: u32) -> Duration;
}

/// Same delay before every retry.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::from_millis(1000)
    }
}

impl BackoffStrategyPlugin for FixedBackoff {
    fn name(&self) -> &str {
        "fixed"
    }

    fn next_delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let b = FixedBackoff::default();
        assert_eq!(b.name(), "fixed");
        assert_eq!(b.next_delay(0), Duration::from_millis(1000));
        assert_eq!(b.next_delay(7), Duration::from_millis(1000));
    }
}
