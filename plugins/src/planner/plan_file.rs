use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use plancraft_core::api::{Decomposer, Decomposition};

use super::parse::parse_decomposition;

/// Reads a prepared plan instead of asking a planner.
///
/// `.toml` and `.json` files hold a `tasks` array and optional `rationale`;
/// any other file is parsed as a numbered list.
pub struct PlanFileDecomposer {
    path: PathBuf,
}

impl PlanFileDecomposer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn parse_plan_file(path: &Path, text: &str) -> anyhow::Result<Decomposition> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(text).context("invalid TOML plan"),
        Some("json") => serde_json::from_str(text).context("invalid JSON plan"),
        _ => parse_decomposition(text),
    }
}

#[async_trait]
impl Decomposer for PlanFileDecomposer {
    fn name(&self) -> &str {
        "plan-file"
    }

    async fn decompose(&self, requirement: &str) -> anyhow::Result<Decomposition> {
        tracing::info!(path = %self.path.display(), requirement, "loading plan file");
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("cannot read plan file {}", self.path.display()))?;
        parse_plan_file(&self.path, &text)
            .with_context(|| format!("invalid plan file {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_toml_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(
            &path,
            r#"
rationale = "schema before API"

[[tasks]]
description = "design the schema"

[[tasks]]
description = "implement the API"
depends_on = [1]
"#,
        )
        .unwrap();

        let d = PlanFileDecomposer::new(&path).decompose("build").await.unwrap();
        assert_eq!(d.subtasks.len(), 2);
        assert_eq!(d.subtasks[1].depends_on, vec![1]);
        assert_eq!(d.rationale.as_deref(), Some("schema before API"));
    }

    #[tokio::test]
    async fn test_markdown_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.md");
        std::fs::write(&path, "1. write lexer\n2. write parser (depends on: 1)\n").unwrap();

        let d = PlanFileDecomposer::new(&path).decompose("build").await.unwrap();
        assert_eq!(d.subtasks[1].description, "write parser");
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let err = PlanFileDecomposer::new("/nonexistent/plan.toml")
            .decompose("x")
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/plan.toml"));
    }
}
