use async_trait::async_trait;
use plancraft_core::api::{Decomposer, Decomposition, SubtaskSpec};

const ANALYZE: &[&str] = &[
    "Read and parse the target code files",
    "Identify potential security vulnerabilities",
    "Generate analysis report with findings",
    "Provide recommendations for fixes",
];

const REFACTOR: &[&str] = &[
    "Analyze current code structure",
    "Identify code smells and improvement areas",
    "Design refactoring strategy",
    "Apply refactoring changes",
    "Verify functionality with tests",
];

const TEST: &[&str] = &[
    "Analyze code to be tested",
    "Design test cases and scenarios",
    "Implement unit tests",
    "Implement integration tests",
    "Run tests and verify coverage",
];

const IMPLEMENT: &[&str] = &[
    "Understand requirements and specifications",
    "Design implementation approach",
    "Write core implementation code",
    "Add error handling and validation",
    "Write tests for new functionality",
    "Document the implementation",
];

const GENERIC: &[&str] = &[
    "Analyze the requirement and gather context",
    "Design the solution approach",
    "Implement the core functionality",
    "Test and validate the implementation",
    "Document changes and create summary",
];

/// Keyword-driven breakdown for runs without an external planner.
///
/// Every step depends on the one before it.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinDecomposer;

impl BuiltinDecomposer {
    fn template(requirement: &str) -> (&'static str, &'static [&'static str]) {
        let lower = requirement.to_lowercase();
        if lower.contains("analyze") {
            ("analysis", ANALYZE)
        } else if lower.contains("refactor") {
            ("refactoring", REFACTOR)
        } else if lower.contains("test") {
            ("testing", TEST)
        } else if lower.contains("implement") || lower.contains("add") {
            ("implementation", IMPLEMENT)
        } else {
            ("generic", GENERIC)
        }
    }
}

#[async_trait]
impl Decomposer for BuiltinDecomposer {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn decompose(&self, requirement: &str) -> anyhow::Result<Decomposition> {
        let (kind, steps) = Self::template(requirement);
        tracing::info!(kind, steps = steps.len(), "using built-in task breakdown");
        let subtasks = steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let spec = SubtaskSpec::new(*step);
                if i == 0 {
                    spec
                } else {
                    spec.depends_on([i as u32])
                }
            })
            .collect();
        Ok(Decomposition {
            subtasks,
            rationale: Some(format!("Built-in {kind} breakdown; each step builds on the previous one.")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refactor_breakdown_is_a_chain() {
        let d = BuiltinDecomposer.decompose("Refactor the parser").await.unwrap();
        assert_eq!(d.subtasks.len(), 5);
        assert_eq!(d.subtasks[0].description, "Analyze current code structure");
        assert!(d.subtasks[0].depends_on.is_empty());
        assert_eq!(d.subtasks[4].depends_on, vec![4]);
    }

    #[tokio::test]
    async fn test_keyword_priority() {
        // "analyze" wins over "test".
        let d = BuiltinDecomposer.decompose("analyze the test suite").await.unwrap();
        assert_eq!(d.subtasks.len(), 4);

        let d = BuiltinDecomposer.decompose("add caching").await.unwrap();
        assert_eq!(d.subtasks.len(), 6);

        let d = BuiltinDecomposer.decompose("make it faster").await.unwrap();
        assert_eq!(d.subtasks[0].description, GENERIC[0]);
    }
}
