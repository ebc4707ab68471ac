use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RetryConfig;

/// Failure class of a backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Worth retrying: network hiccups, throttling, unavailable services.
    Transient,
    /// Retrying will not help: bad input, missing resources, auth failures.
    Permanent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transient => f.write_str("TRANSIENT"),
            FailureKind::Permanent => f.write_str("PERMANENT"),
        }
    }
}

const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "connection refused",
    "connection reset",
    "network unreachable",
    "service unavailable",
    "temporarily unavailable",
    "too many requests",
    "rate limit",
    "temporary",
    "try again",
    // http status codes
    "408",
    "429",
    "500",
    "502",
    "503",
    "504",
];

const PERMANENT_MARKERS: &[&str] = &[
    "not found",
    "404",
    "400",
    "401",
    "403",
    "invalid",
    "malformed",
    "unsupported",
    "cannot",
    "failed to parse",
];

/// Keyword classifier over error messages.
///
/// Transient markers win over permanent ones, and a message matching
/// neither list is treated as transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassifier {
    transient_max_retries: u32,
    permanent_max_retries: u32,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(3, 0)
    }
}

impl ErrorClassifier {
    pub fn new(transient_max_retries: u32, permanent_max_retries: u32) -> Self {
        Self {
            transient_max_retries,
            permanent_max_retries,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(cfg.transient_max_retries, cfg.permanent_max_retries)
    }

    pub fn classify(&self, message: &str) -> FailureKind {
        if message.trim().is_empty() {
            return FailureKind::Permanent;
        }

        let lower = message.to_lowercase();
        if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
            return FailureKind::Transient;
        }
        if PERMANENT_MARKERS.iter().any(|m| lower.contains(m)) {
            return FailureKind::Permanent;
        }

        FailureKind::Transient
    }

    /// Retry budget for a failure class.
    pub fn max_retries(&self, kind: FailureKind) -> u32 {
        match kind {
            FailureKind::Transient => self.transient_max_retries,
            FailureKind::Permanent => self.permanent_max_retries,
        }
    }

    /// Budget for the class `message` falls into.
    pub fn budget_for(&self, message: &str) -> u32 {
        self.max_retries(self.classify(message))
    }

    /// First line of a message, for one-line notices.
    pub fn describe(message: &str) -> &str {
        message.lines().next().unwrap_or("Unknown error")
    }

    pub fn is_recoverable(&self, message: &str) -> bool {
        self.classify(message) == FailureKind::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_messages() {
        let c = ErrorClassifier::default();
        assert_eq!(c.classify("connection timeout"), FailureKind::Transient);
        assert_eq!(c.classify("HTTP 503 Service Unavailable"), FailureKind::Transient);
        assert_eq!(c.classify("Rate limit exceeded"), FailureKind::Transient);
        assert_eq!(c.classify("Connection refused (os error 111)"), FailureKind::Transient);
    }

    #[test]
    fn test_permanent_messages() {
        let c = ErrorClassifier::default();
        assert_eq!(c.classify("404 resource not found"), FailureKind::Permanent);
        assert_eq!(c.classify("invalid argument"), FailureKind::Permanent);
        assert_eq!(c.classify("Failed to parse response"), FailureKind::Permanent);
        assert_eq!(c.classify(""), FailureKind::Permanent);
    }

    #[test]
    fn test_transient_wins_over_permanent() {
        let c = ErrorClassifier::default();
        assert_eq!(
            c.classify("resource not found, try again later"),
            FailureKind::Transient
        );
    }

    #[test]
    fn test_unknown_defaults_to_transient() {
        let c = ErrorClassifier::default();
        assert_eq!(c.classify("something odd happened"), FailureKind::Transient);
        assert!(c.is_recoverable("something odd happened"));
    }

    #[test]
    fn test_budgets() {
        let c = ErrorClassifier::default();
        assert_eq!(c.max_retries(FailureKind::Transient), 3);
        assert_eq!(c.max_retries(FailureKind::Permanent), 0);

        let custom = ErrorClassifier::new(5, 1);
        assert_eq!(custom.budget_for("timeout"), 5);
        assert_eq!(custom.budget_for("invalid"), 1);
    }

    #[test]
    fn test_describe_takes_first_line() {
        assert_eq!(
            ErrorClassifier::describe("exit status 2\nstack trace\nmore"),
            "exit status 2"
        );
    }
}
