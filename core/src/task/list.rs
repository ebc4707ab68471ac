use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::transitions::TransitionError;
use super::types::{SubtaskSpec, Task, TaskId};
use crate::error::PlanError;
use crate::graph::DependencyResolver;

/// Ordered tasks derived from one requirement, walked with a forward-only cursor.
///
/// Only the task under the cursor is ever started, completed or skipped, so
/// `cursor == tasks.len()` exactly when every task is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    requirement: String,
    tasks: Vec<Task>,
    cursor: usize,
    #[serde(default)]
    rationale: Option<String>,
}

impl TaskList {
    /// Build a list from tasks already in execution order.
    pub fn new(requirement: impl Into<String>, tasks: Vec<Task>, rationale: Option<String>) -> Self {
        Self {
            requirement: requirement.into(),
            tasks,
            cursor: 0,
            rationale,
        }
    }

    /// Assign ids 1.. in decomposition order, validate the graph and order
    /// the tasks so every prerequisite precedes its dependents.
    pub fn from_specs(
        requirement: impl Into<String>,
        specs: Vec<SubtaskSpec>,
        rationale: Option<String>,
    ) -> Result<Self, PlanError> {
        let tasks: Vec<Task> = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Task::new(i as TaskId + 1, spec.description).with_dependencies(spec.depends_on))
            .collect();

        let order = {
            let resolver = DependencyResolver::new(&tasks)?;
            resolver.validate()?;
            resolver.topological_order()?
        };

        let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
        let ordered = order
            .into_iter()
            .filter_map(|id| slots.get_mut(id as usize - 1).and_then(Option::take))
            .collect();

        Ok(Self::new(requirement, ordered, rationale))
    }

    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.get(self.cursor)
    }

    pub fn current_task_mut(&mut self) -> Option<&mut Task> {
        self.tasks.get_mut(self.cursor)
    }

    /// Mark the current task in progress. No-op when it already is.
    pub fn start_current(&mut self) -> Result<Option<TaskId>, TransitionError> {
        match self.tasks.get_mut(self.cursor) {
            Some(task) if task.is_pending() => {
                task.start()?;
                Ok(Some(task.id))
            }
            Some(task) => Ok(Some(task.id)),
            None => Ok(None),
        }
    }

    /// Complete the current task and advance the cursor.
    pub fn complete_current(&mut self, output: impl Into<String>) -> Result<Option<TaskId>, TransitionError> {
        let Some(task) = self.tasks.get_mut(self.cursor) else {
            return Ok(None);
        };
        task.complete(output)?;
        let id = task.id;
        self.cursor += 1;
        Ok(Some(id))
    }

    /// Skip the current task (pending or in progress) and advance the cursor.
    pub fn skip_current(&mut self) -> Result<Option<TaskId>, TransitionError> {
        let Some(task) = self.tasks.get_mut(self.cursor) else {
            return Ok(None);
        };
        task.skip()?;
        let id = task.id;
        self.cursor += 1;
        Ok(Some(id))
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.tasks.len()
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.is_completed()).collect()
    }

    pub fn pending_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.is_pending()).collect()
    }

    pub fn skipped_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.is_skipped()).collect()
    }

    pub fn total_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_skipped()).count()
    }

    /// Integer percentage of completed tasks; an empty list counts as done.
    pub fn progress_percentage(&self) -> u32 {
        if self.tasks.is_empty() {
            return 100;
        }
        ((self.completed_count() * 100) / self.tasks.len()) as u32
    }

    /// Plain-text rendering: every task, or just the one under the cursor.
    pub fn display(&self, show_all: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Task List: {}/{} completed ({}%)",
            self.completed_count(),
            self.total_count(),
            self.progress_percentage()
        );
        let _ = writeln!(out, "Requirement: {}", self.requirement);

        if show_all {
            for task in &self.tasks {
                let current = if task.is_in_progress() { "  <- current" } else { "" };
                let _ = writeln!(out, "  {}{}", task, current);
            }
        } else {
            match self.current_task() {
                Some(task) => {
                    let _ = writeln!(
                        out,
                        "Current task [{}/{}]: {}",
                        self.cursor + 1,
                        self.tasks.len(),
                        task.description
                    );
                }
                None => {
                    let _ = writeln!(out, "All tasks resolved");
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn specs(descs: &[&str]) -> Vec<SubtaskSpec> {
        descs.iter().map(|d| SubtaskSpec::new(*d)).collect()
    }

    #[test]
    fn test_ids_follow_decomposition_order() {
        let list = TaskList::from_specs("req", specs(&["a", "b", "c"]), None).unwrap();
        let ids: Vec<TaskId> = list.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(list.current_task().map(|t| t.id), Some(1));
    }

    #[test]
    fn test_prerequisites_are_ordered_first() {
        let specs = vec![
            SubtaskSpec::new("deploy").depends_on([2]),
            SubtaskSpec::new("build"),
        ];
        let list = TaskList::from_specs("ship it", specs, None).unwrap();
        let ids: Vec<TaskId> = list.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_cycle_builds_no_list() {
        let specs = vec![
            SubtaskSpec::new("a").depends_on([2]),
            SubtaskSpec::new("b").depends_on([1]),
        ];
        assert!(matches!(
            TaskList::from_specs("req", specs, None),
            Err(PlanError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_cursor_advances_to_end() {
        let mut list = TaskList::from_specs("req", specs(&["a", "b"]), None).unwrap();
        assert_eq!(list.progress_percentage(), 0);

        list.start_current().unwrap();
        assert_eq!(list.complete_current("out a").unwrap(), Some(1));
        assert_eq!(list.cursor(), 1);
        assert!(!list.is_finished());

        assert_eq!(list.skip_current().unwrap(), Some(2));
        assert!(list.is_finished());
        assert_eq!(list.cursor(), list.total_count());
        assert_eq!(list.completed_count(), 1);
        assert_eq!(list.skipped_count(), 1);
        assert_eq!(list.progress_percentage(), 50);

        assert_eq!(list.complete_current("extra").unwrap(), None);
    }

    #[test]
    fn test_complete_requires_started_task() {
        let mut list = TaskList::from_specs("req", specs(&["a"]), None).unwrap();
        assert!(list.complete_current("x").is_err());
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn test_empty_list_is_fully_done() {
        let list = TaskList::new("req", Vec::new(), None);
        assert!(list.is_finished());
        assert_eq!(list.progress_percentage(), 100);
    }

    #[test]
    fn test_display() {
        let mut list = TaskList::from_specs("build a CLI", specs(&["design", "implement"]), None).unwrap();
        list.start_current().unwrap();

        let full = list.display(true);
        assert!(full.contains("Task List: 0/2 completed (0%)"));
        assert!(full.contains("[>] Task 1: design  <- current"));
        assert!(full.contains("[ ] Task 2: implement"));

        let current = list.display(false);
        assert!(current.contains("Current task [1/2]: design"));
    }

    #[test]
    fn test_snapshot_round_trip_keeps_cursor() {
        let mut list = TaskList::from_specs("req", specs(&["a", "b"]), Some("why".into())).unwrap();
        list.start_current().unwrap();
        list.complete_current("done").unwrap();

        let json = serde_json::to_string(&list).unwrap();
        let restored: TaskList = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.cursor(), 1);
        assert_eq!(restored.rationale(), Some("why"));
        assert_eq!(restored.tasks()[0].output(), Some("done"));
    }
}
