use std::time::Duration;

use plancraft_core::api::{BackoffStrategyPlugin, RetryConfig};

/// `base * 2^attempt`, capped at `max`.
pub struct ExponentialBackoff {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

/// `base * (attempt + 1)`, capped at `max`.
pub struct LinearBackoff {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl ExponentialBackoff {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(cfg.delay_ms, cfg.max_delay_ms)
    }
}

impl LinearBackoff {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(cfg.delay_ms, cfg.max_delay_ms)
    }
}

impl BackoffStrategyPlugin for ExponentialBackoff {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let exp = 1u64 << attempt.min(30);
        let delay = self.base_delay_ms.saturating_mul(exp);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

impl BackoffStrategyPlugin for LinearBackoff {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let multiplier = attempt.saturating_add(1) as u64;
        let delay = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}
