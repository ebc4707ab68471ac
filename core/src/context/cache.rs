use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::execution::ContextSnapshot;
use super::store::ContextStore;
use crate::error::CacheError;
use crate::task::{TaskId, TaskList};

const PREFIX_REQUIREMENT: &str = "task-ctx:requirement:";
const PREFIX_ANALYSIS: &str = "task-ctx:analysis:";
const PREFIX_TASKS: &str = "task-ctx:tasks:";
const PREFIX_RESULT: &str = "task-ctx:result:";
const PREFIX_CONTEXT: &str = "task-ctx:context:";

const SUMMARY_OUTPUT_CHARS: usize = 100;

/// Outcome of one task as kept in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultRecord {
    pub task_id: TaskId,
    pub description: String,
    pub output: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl TaskResultRecord {
    pub fn new(
        task_id: TaskId,
        description: impl Into<String>,
        output: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            task_id,
            description: description.into(),
            output: output.into(),
            success,
            timestamp: Utc::now(),
        }
    }
}

/// Typed view over a [`ContextStore`] for one session.
#[derive(Clone)]
pub struct TaskContextCache {
    store: Arc<dyn ContextStore>,
    session_id: String,
}

impl TaskContextCache {
    pub fn new(store: Arc<dyn ContextStore>, session_id: impl Into<String>) -> Self {
        Self {
            store,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    fn key(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.session_id)
    }

    fn result_key(&self, task_id: TaskId) -> String {
        format!("{PREFIX_RESULT}{}:{task_id}", self.session_id)
    }

    async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        self.store.put(key, &json).await
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn cache_requirement(&self, requirement: &str) -> Result<(), CacheError> {
        if requirement.is_empty() {
            return Ok(());
        }
        self.put_json(&self.key(PREFIX_REQUIREMENT), requirement).await
    }

    pub async fn requirement(&self) -> Result<Option<String>, CacheError> {
        self.get_json(&self.key(PREFIX_REQUIREMENT)).await
    }

    pub async fn cache_analysis(&self, analysis: &str) -> Result<(), CacheError> {
        if analysis.is_empty() {
            return Ok(());
        }
        self.put_json(&self.key(PREFIX_ANALYSIS), analysis).await
    }

    pub async fn analysis(&self) -> Result<Option<String>, CacheError> {
        self.get_json(&self.key(PREFIX_ANALYSIS)).await
    }

    pub async fn cache_task_list(&self, list: &TaskList) -> Result<(), CacheError> {
        self.put_json(&self.key(PREFIX_TASKS), list).await
    }

    pub async fn task_list(&self) -> Result<Option<TaskList>, CacheError> {
        self.get_json(&self.key(PREFIX_TASKS)).await
    }

    pub async fn cache_task_result(&self, record: &TaskResultRecord) -> Result<(), CacheError> {
        self.put_json(&self.result_key(record.task_id), record).await
    }

    pub async fn task_result(&self, task_id: TaskId) -> Result<Option<TaskResultRecord>, CacheError> {
        self.get_json(&self.result_key(task_id)).await
    }

    /// Every cached result of this session, ordered by task id.
    pub async fn task_results(&self) -> Result<Vec<TaskResultRecord>, CacheError> {
        let prefix = format!("{PREFIX_RESULT}{}:", self.session_id);
        let mut results = Vec::new();
        for key in self.store.keys(&prefix).await? {
            if let Some(record) = self.get_json::<TaskResultRecord>(&key).await? {
                results.push(record);
            }
        }
        results.sort_by_key(|r| r.task_id);
        Ok(results)
    }

    pub async fn cache_context(&self, snapshot: &ContextSnapshot) -> Result<(), CacheError> {
        self.put_json(&self.key(PREFIX_CONTEXT), snapshot).await
    }

    pub async fn context(&self) -> Result<Option<ContextSnapshot>, CacheError> {
        self.get_json(&self.key(PREFIX_CONTEXT)).await
    }

    /// Markdown summary of what the cache holds for this session.
    ///
    /// Read errors degrade to a shorter summary.
    pub async fn build_session_summary(&self) -> String {
        let mut out = String::from("## Session Context\n");
        out.push_str(&format!("Session ID: {}\n\n", self.session_id));

        if let Ok(Some(requirement)) = self.requirement().await {
            out.push_str("### Requirement\n");
            out.push_str(&requirement);
            out.push_str("\n\n");
        }

        let list = self.task_list().await.ok().flatten();
        let Some(list) = list else {
            return out;
        };

        out.push_str(&format!("### Tasks ({})\n", list.total_count()));
        for task in list.tasks() {
            out.push_str(&format!("{} #{}: {}\n", task.status().marker(), task.id, task.description));
        }
        out.push('\n');

        let completed = list.completed_tasks();
        if !completed.is_empty() {
            out.push_str(&format!("### Completed ({})\n", completed.len()));
            for task in completed {
                if let Ok(Some(record)) = self.task_result(task.id).await {
                    out.push_str(&format!(
                        "  #{}: {}\n",
                        task.id,
                        truncate(&record.output, SUMMARY_OUTPUT_CHARS)
                    ));
                }
            }
            out.push('\n');
        }

        out
    }

    pub async fn stats(&self) -> CacheStats {
        let list = self.task_list().await.ok().flatten();
        let tasks = list.as_ref().map(|l| l.tasks()).unwrap_or(&[]);
        CacheStats {
            session_id: self.session_id.clone(),
            store: self.store.name().to_string(),
            requirement_cached: matches!(self.requirement().await, Ok(Some(_))),
            analysis_cached: matches!(self.analysis().await, Ok(Some(_))),
            total_tasks: tasks.len(),
            completed: tasks.iter().filter(|t| t.is_completed()).count(),
            in_progress: tasks.iter().filter(|t| t.is_in_progress()).count(),
            pending: tasks.iter().filter(|t| t.is_pending()).count(),
            results: self.task_results().await.map(|r| r.len()).unwrap_or(0),
        }
    }
}

impl fmt::Debug for TaskContextCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContextCache")
            .field("store", &self.store.name())
            .field("session_id", &self.session_id)
            .finish()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}...")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub session_id: String,
    pub store: String,
    pub requirement_cached: bool,
    pub analysis_cached: bool,
    pub total_tasks: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub results: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = |b: bool| if b { "cached" } else { "not cached" };
        writeln!(f, "Task context cache ({})", self.store)?;
        writeln!(f, "Session ID: {}", self.session_id)?;
        writeln!(f, "Requirement: {}", cached(self.requirement_cached))?;
        writeln!(f, "Analysis: {}", cached(self.analysis_cached))?;
        writeln!(f, "Tasks: {}", self.total_tasks)?;
        writeln!(f, "  completed:   {}", self.completed)?;
        writeln!(f, "  in progress: {}", self.in_progress)?;
        writeln!(f, "  pending:     {}", self.pending)?;
        write!(f, "Cached results: {}", self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryContextStore;
    use crate::task::SubtaskSpec;

    fn cache() -> TaskContextCache {
        TaskContextCache::new(Arc::new(MemoryContextStore::new()), "s-1")
    }

    #[tokio::test]
    async fn test_requirement_and_analysis() {
        let c = cache();
        assert_eq!(c.requirement().await.unwrap(), None);
        c.cache_requirement("build a CLI").await.unwrap();
        c.cache_analysis("").await.unwrap();
        assert_eq!(c.requirement().await.unwrap().as_deref(), Some("build a CLI"));
        assert_eq!(c.analysis().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_results_are_session_scoped() {
        let store: Arc<dyn ContextStore> = Arc::new(MemoryContextStore::new());
        let a = TaskContextCache::new(store.clone(), "a");
        let b = TaskContextCache::new(store.clone(), "b");

        a.cache_task_result(&TaskResultRecord::new(2, "two", "out 2", true)).await.unwrap();
        a.cache_task_result(&TaskResultRecord::new(1, "one", "out 1", true)).await.unwrap();
        b.cache_task_result(&TaskResultRecord::new(1, "other", "x", false)).await.unwrap();

        let ids: Vec<TaskId> = a.task_results().await.unwrap().iter().map(|r| r.task_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(b.task_results().await.unwrap().len(), 1);
        assert!(store.get("task-ctx:result:a:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_summary_and_stats() {
        let c = cache();
        let mut list = TaskList::from_specs(
            "req",
            vec![SubtaskSpec::new("first"), SubtaskSpec::new("second")],
            None,
        )
        .unwrap();
        list.start_current().unwrap();
        list.complete_current("x".repeat(150)).unwrap();
        list.start_current().unwrap();

        c.cache_requirement("req").await.unwrap();
        c.cache_task_list(&list).await.unwrap();
        c.cache_task_result(&TaskResultRecord::new(1, "first", "x".repeat(150), true))
            .await
            .unwrap();

        let summary = c.build_session_summary().await;
        assert!(summary.contains("Session ID: s-1"));
        assert!(summary.contains("[x] #1: first"));
        assert!(summary.contains(&format!("  #1: {}...", "x".repeat(100))));

        let stats = c.stats().await;
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.pending, 0);
        assert!(stats.requirement_cached);
        assert!(!stats.analysis_cached);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("短文本", 10), "短文本");
        assert_eq!(truncate("编写实现代码", 2), "编写...");
    }
}
