use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cache::{TaskContextCache, TaskResultRecord};
use crate::error::CacheError;
use crate::task::{TaskId, TaskList};

/// Serializable part of an [`ExecutionContext`], persisted under the
/// `context` cache category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub requirement: String,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub decisions: BTreeMap<String, String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    pub saved_at: DateTime<Utc>,
}

/// Everything one plan session knows beyond the task list itself.
#[derive(Debug)]
pub struct ExecutionContext {
    requirement: String,
    rationale: Option<String>,
    decisions: BTreeMap<String, String>,
    constraints: Vec<String>,
    risks: Vec<String>,
    results: BTreeMap<TaskId, TaskResultRecord>,
    cache: TaskContextCache,
}

impl ExecutionContext {
    pub fn new(requirement: impl Into<String>, rationale: Option<String>, cache: TaskContextCache) -> Self {
        let mut ctx = Self {
            requirement: requirement.into(),
            rationale: None,
            decisions: BTreeMap::new(),
            constraints: Vec::new(),
            risks: Vec::new(),
            results: BTreeMap::new(),
            cache,
        };
        if let Some(rationale) = rationale {
            ctx.set_rationale(rationale);
        }
        ctx
    }

    /// Rebuild a context from a cached snapshot and cached results.
    pub async fn restore(snapshot: ContextSnapshot, cache: TaskContextCache) -> Self {
        let results = match cache.task_results().await {
            Ok(records) => records.into_iter().map(|r| (r.task_id, r)).collect(),
            Err(err) => {
                warn_cache("read task results", &err);
                BTreeMap::new()
            }
        };
        Self {
            requirement: snapshot.requirement,
            rationale: snapshot.rationale,
            decisions: snapshot.decisions,
            constraints: snapshot.constraints,
            risks: snapshot.risks,
            results,
            cache,
        }
    }

    pub fn session_id(&self) -> &str {
        self.cache.session_id()
    }

    pub fn cache(&self) -> &TaskContextCache {
        &self.cache
    }

    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    /// Store the decomposition rationale and pull constraints and risks out
    /// of its `## Constraints` / `## Risks` sections.
    pub fn set_rationale(&mut self, rationale: impl Into<String>) {
        let rationale = rationale.into();
        let mut section: Option<String> = None;
        for line in rationale.lines().map(str::trim) {
            if let Some(title) = line.strip_prefix("##") {
                section = Some(title.trim_start_matches('#').trim().to_string());
                continue;
            }
            let Some(item) = line.strip_prefix('-') else {
                continue;
            };
            match section.as_deref() {
                Some("Constraints") => self.constraints.push(item.trim().to_string()),
                Some("Risks") => self.risks.push(item.trim().to_string()),
                _ => {}
            }
        }
        self.rationale = Some(rationale);
    }

    pub fn add_decision(&mut self, decision: impl Into<String>, reasoning: impl Into<String>) {
        self.decisions.insert(decision.into(), reasoning.into());
    }

    pub fn decisions(&self) -> &BTreeMap<String, String> {
        &self.decisions
    }

    pub fn constraints(&self) -> &[String] {
        &self.constraints
    }

    pub fn risks(&self) -> &[String] {
        &self.risks
    }

    pub fn result(&self, task_id: TaskId) -> Option<&TaskResultRecord> {
        self.results.get(&task_id)
    }

    pub fn results(&self) -> impl Iterator<Item = &TaskResultRecord> {
        self.results.values()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            requirement: self.requirement.clone(),
            rationale: self.rationale.clone(),
            decisions: self.decisions.clone(),
            constraints: self.constraints.clone(),
            risks: self.risks.clone(),
            saved_at: Utc::now(),
        }
    }

    /// Write requirement, rationale, context snapshot and task list.
    pub async fn persist_plan(&self, list: &TaskList) {
        if let Err(err) = self.cache.cache_requirement(&self.requirement).await {
            warn_cache("cache requirement", &err);
        }
        if let Some(rationale) = &self.rationale {
            if let Err(err) = self.cache.cache_analysis(rationale).await {
                warn_cache("cache rationale", &err);
            }
        }
        self.persist_context().await;
        self.persist_task_list(list).await;
    }

    /// Write the context snapshot (decisions, constraints, risks).
    pub async fn persist_context(&self) {
        if let Err(err) = self.cache.cache_context(&self.snapshot()).await {
            warn_cache("cache execution context", &err);
        }
    }

    pub async fn persist_task_list(&self, list: &TaskList) {
        if let Err(err) = self.cache.cache_task_list(list).await {
            warn_cache("cache task list", &err);
        }
    }

    pub async fn record_task_result(
        &mut self,
        task_id: TaskId,
        description: &str,
        output: &str,
        success: bool,
    ) {
        let record = TaskResultRecord::new(task_id, description, output, success);
        if let Err(err) = self.cache.cache_task_result(&record).await {
            warn_cache("cache task result", &err);
        }
        self.results.insert(task_id, record);
    }

    /// Context text handed to role executors.
    pub async fn build_prompt_context(&self, list: &TaskList) -> String {
        let mut out = String::new();
        out.push_str("## Original Requirement\n");
        out.push_str(list.requirement());
        out.push_str("\n\n");

        if let Some(rationale) = list.rationale().filter(|r| !r.is_empty()) {
            out.push_str("## Planning Rationale\n");
            out.push_str(rationale);
            out.push_str("\n\n");
        }

        let completed = list.completed_tasks();
        if !completed.is_empty() {
            out.push_str("## Completed Tasks\n");
            for task in completed {
                out.push_str(&format!("- Task {}: {}\n", task.id, task.description));
                if let Some(output) = task.output().filter(|o| !o.is_empty()) {
                    out.push_str(&format!("  Output: {output}\n"));
                }
            }
            out.push('\n');
        }

        let summary = self.cache.build_session_summary().await;
        if !summary.is_empty() {
            out.push_str(&summary);
        }
        out
    }

    pub fn context_report(&self) -> String {
        let mut out = String::from("## Task Execution Context\n\n");
        out.push_str(&format!("Session ID: {}\n\n", self.session_id()));
        out.push_str("### Original Requirement\n");
        out.push_str(&self.requirement);
        out.push_str("\n\n");

        if !self.constraints.is_empty() {
            out.push_str("### Constraints\n");
            for c in &self.constraints {
                out.push_str(&format!("- {c}\n"));
            }
            out.push('\n');
        }
        if !self.risks.is_empty() {
            out.push_str("### Risks\n");
            for r in &self.risks {
                out.push_str(&format!("- {r}\n"));
            }
            out.push('\n');
        }
        if !self.decisions.is_empty() {
            out.push_str("### Key Decisions\n");
            for (decision, reasoning) in &self.decisions {
                out.push_str(&format!("- {decision}\n  Reasoning: {reasoning}\n"));
            }
            out.push('\n');
        }
        if !self.results.is_empty() {
            out.push_str("### Task Results\n");
            for record in self.results.values() {
                let status = if record.success { "SUCCESS" } else { "FAILED" };
                out.push_str(&format!(
                    "- Task {}: {}\n  Status: {status}\n",
                    record.task_id, record.description
                ));
            }
        }
        out
    }
}

fn warn_cache(what: &str, err: &CacheError) {
    tracing::warn!(error = %err, "failed to {what}; continuing without it");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::MemoryContextStore;
    use crate::task::SubtaskSpec;

    fn ctx(rationale: Option<&str>) -> ExecutionContext {
        let cache = TaskContextCache::new(Arc::new(MemoryContextStore::new()), "sess");
        ExecutionContext::new("build a parser", rationale.map(str::to_string), cache)
    }

    #[test]
    fn test_extracts_constraints_and_risks() {
        let c = ctx(Some(
            "Plan overview\n## Constraints\n- no unsafe\n- stable Rust only\n## Risks\n- grammar ambiguity\n## Notes\n- ignored",
        ));
        assert_eq!(c.constraints(), &["no unsafe", "stable Rust only"]);
        assert_eq!(c.risks(), &["grammar ambiguity"]);
    }

    #[tokio::test]
    async fn test_prompt_context_lists_completed_outputs() {
        let mut c = ctx(Some("split lexer from parser"));
        let mut list = TaskList::from_specs(
            "build a parser",
            vec![SubtaskSpec::new("write lexer"), SubtaskSpec::new("write parser")],
            Some("split lexer from parser".into()),
        )
        .unwrap();
        list.start_current().unwrap();
        list.complete_current("lexer.rs").unwrap();
        c.record_task_result(1, "write lexer", "lexer.rs", true).await;
        c.persist_plan(&list).await;

        let text = c.build_prompt_context(&list).await;
        assert!(text.starts_with("## Original Requirement\nbuild a parser\n\n"));
        assert!(text.contains("## Planning Rationale\nsplit lexer from parser"));
        assert!(text.contains("- Task 1: write lexer\n  Output: lexer.rs\n"));
        assert!(text.contains("Session ID: sess"));
    }

    #[tokio::test]
    async fn test_restore_from_snapshot() {
        let mut c = ctx(Some("## Risks\n- flaky network"));
        c.add_decision("use tokio", "async process handling");
        c.record_task_result(3, "lint", "clean", true).await;
        let snapshot = c.snapshot();

        let restored = ExecutionContext::restore(snapshot, c.cache().clone()).await;
        assert_eq!(restored.risks(), &["flaky network"]);
        assert_eq!(restored.decisions().get("use tokio").map(String::as_str), Some("async process handling"));
        assert!(restored.result(3).is_some());

        let report = restored.context_report();
        assert!(report.contains("### Key Decisions\n- use tokio\n  Reasoning: async process handling"));
        assert!(report.contains("- Task 3: lint\n  Status: SUCCESS"));
    }
}
