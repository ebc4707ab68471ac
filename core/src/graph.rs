use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::error::PlanError;
use crate::task::{Task, TaskId};

/// Read-only dependency view over a slice of tasks.
///
/// Edges point from a task to the tasks it depends on. The resolver never
/// mutates tasks; it answers ordering and readiness questions for the
/// orchestrator and for reporting.
#[derive(Debug, Clone)]
pub struct DependencyResolver<'a> {
    tasks: &'a [Task],
    /// task id -> position in `tasks`
    index: HashMap<TaskId, usize>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(tasks: &'a [Task]) -> Result<Self, PlanError> {
        let mut index = HashMap::with_capacity(tasks.len());
        for (pos, task) in tasks.iter().enumerate() {
            if index.insert(task.id, pos).is_some() {
                return Err(PlanError::DuplicateTaskId(task.id));
            }
        }
        Ok(Self { tasks, index })
    }

    pub fn get(&self, id: TaskId) -> Option<&'a Task> {
        self.index.get(&id).map(|&pos| &self.tasks[pos])
    }

    /// Fail on a dependency cycle.
    ///
    /// Dangling dependencies are tolerated here; they only make the
    /// dependent task permanently not-ready.
    pub fn validate(&self) -> Result<(), PlanError> {
        match self.detect_cycle() {
            Some(cycle) => Err(PlanError::CircularDependency(cycle)),
            None => Ok(()),
        }
    }

    /// Every pending task whose dependencies are all completed, in list order.
    pub fn ready_tasks(&self) -> Vec<&'a Task> {
        self.tasks
            .iter()
            .filter(|t| t.is_pending() && self.can_execute(t))
            .collect()
    }

    /// True when every dependency of `task` is completed.
    pub fn can_execute(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|dep| match self.get(*dep) {
            Some(d) => d.is_completed(),
            None => {
                tracing::warn!(
                    task_id = task.id,
                    missing_dep = *dep,
                    "task depends on an unknown task; it can never run"
                );
                false
            }
        })
    }

    /// First unmet dependency of `task`, if any.
    pub fn first_unmet_dependency(&self, task: &Task) -> Option<TaskId> {
        task.dependencies
            .iter()
            .copied()
            .find(|dep| !self.get(*dep).is_some_and(|d| d.is_completed()))
    }

    /// First dependency of `task` that can never complete: one that was
    /// skipped or that names an unknown task.
    pub fn unsatisfiable_dependency(&self, task: &Task) -> Option<TaskId> {
        task.dependencies
            .iter()
            .copied()
            .find(|dep| match self.get(*dep) {
                Some(d) => d.is_skipped(),
                None => true,
            })
    }

    /// Tasks that list `id` as a dependency, in list order.
    pub fn dependents_of(&self, id: TaskId) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.dependencies.contains(&id))
            .map(|t| t.id)
            .collect()
    }

    /// Stable topological order (Kahn's algorithm, list order breaks ties).
    ///
    /// Edges to unknown tasks are ignored so they cannot stall the sort.
    pub fn topological_order(&self) -> Result<Vec<TaskId>, PlanError> {
        let mut in_degree: Vec<usize> = vec![0; self.tasks.len()];
        let mut reverse_edges: Vec<Vec<usize>> = vec![Vec::new(); self.tasks.len()];

        for (pos, task) in self.tasks.iter().enumerate() {
            let mut seen = HashSet::new();
            for dep in &task.dependencies {
                if let Some(&dep_pos) = self.index.get(dep) {
                    if seen.insert(dep_pos) {
                        in_degree[pos] += 1;
                        reverse_edges[dep_pos].push(pos);
                    }
                }
            }
        }

        // Smallest list position first keeps the order stable.
        let mut ready: VecDeque<usize> = (0..self.tasks.len())
            .filter(|&pos| in_degree[pos] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());

        while let Some(pos) = pop_min(&mut ready) {
            order.push(self.tasks[pos].id);
            for &dependent in &reverse_edges[pos] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        if order.len() != self.tasks.len() {
            let cycle = self
                .detect_cycle()
                .unwrap_or_else(|| "unable to complete topological sort".to_string());
            return Err(PlanError::CircularDependency(cycle));
        }

        Ok(order)
    }

    /// Longest dependency chain, from the ultimate prerequisite to the final task.
    pub fn critical_path(&self) -> Vec<TaskId> {
        if self.tasks.is_empty() {
            return Vec::new();
        }

        let mut memo: HashMap<TaskId, usize> = HashMap::new();
        let mut guard: HashSet<TaskId> = HashSet::new();

        let mut best: Option<(TaskId, usize)> = None;
        for task in self.tasks {
            let depth = self.depth(task.id, &mut memo, &mut guard);
            if best.map_or(true, |(_, d)| depth > d) {
                best = Some((task.id, depth));
            }
        }

        let mut path = Vec::new();
        let mut current = best.map(|(id, _)| id);
        while let Some(id) = current {
            path.push(id);
            current = self.get(id).and_then(|task| {
                let mut deepest: Option<(TaskId, usize)> = None;
                for dep in &task.dependencies {
                    if self.get(*dep).is_none() || path.contains(dep) {
                        continue;
                    }
                    let d = memo.get(dep).copied().unwrap_or(0);
                    if deepest.map_or(true, |(_, best)| d > best) {
                        deepest = Some((*dep, d));
                    }
                }
                deepest.map(|(id, _)| id)
            });
        }

        path.reverse();
        path
    }

    fn depth(
        &self,
        id: TaskId,
        memo: &mut HashMap<TaskId, usize>,
        guard: &mut HashSet<TaskId>,
    ) -> usize {
        if let Some(&d) = memo.get(&id) {
            return d;
        }
        let Some(task) = self.get(id) else {
            return 0;
        };
        // Cycles are rejected by validate(); the guard only keeps reporting total.
        if !guard.insert(id) {
            return 0;
        }

        let max_dep = task
            .dependencies
            .iter()
            .filter(|dep| self.index.contains_key(dep))
            .map(|dep| self.depth(*dep, memo, guard))
            .max()
            .unwrap_or(0);

        guard.remove(&id);
        let depth = max_dep + 1;
        memo.insert(id, depth);
        depth
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_tasks: self.tasks.len(),
            tasks_with_dependencies: self.tasks.iter().filter(|t| t.has_dependencies()).count(),
            critical_path: self.critical_path(),
        }
    }

    /// Detect circular dependencies using DFS with visiting/visited marks.
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task in self.tasks {
            if !visited.contains(&task.id) && self.dfs_cycle(task.id, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: TaskId,
        visited: &mut HashSet<TaskId>,
        stack: &mut Vec<TaskId>,
    ) -> bool {
        visited.insert(node);
        stack.push(node);

        if let Some(task) = self.get(node) {
            for dep in &task.dependencies {
                // Still on the current path: cycle.
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(*dep);
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep) && self.dfs_cycle(*dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

fn pop_min(queue: &mut VecDeque<usize>) -> Option<usize> {
    let (idx, _) = queue.iter().enumerate().min_by_key(|(_, pos)| **pos)?;
    queue.remove(idx)
}

fn format_cycle_path(stack: &[TaskId]) -> String {
    stack
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Summary numbers for a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub total_tasks: usize,
    pub tasks_with_dependencies: usize,
    pub critical_path: Vec<TaskId>,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total tasks: {}", self.total_tasks)?;
        writeln!(f, "Tasks with dependencies: {}", self.tasks_with_dependencies)?;
        writeln!(f, "Critical path length: {}", self.critical_path.len())?;
        write!(
            f,
            "Critical path: {}",
            format_cycle_path(&self.critical_path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn task(id: TaskId, deps: &[TaskId]) -> Task {
        Task::new(id, format!("task {id}")).with_dependencies(deps.iter().copied())
    }

    fn completed(id: TaskId, deps: &[TaskId]) -> Task {
        let mut t = task(id, deps);
        t.start().unwrap();
        t.complete("ok").unwrap();
        t
    }

    #[test]
    fn test_validate_accepts_dag() {
        let tasks = vec![task(1, &[]), task(2, &[1]), task(3, &[1, 2])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        assert!(resolver.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_cycle_path() {
        let tasks = vec![task(1, &[3]), task(2, &[1]), task(3, &[2])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        match resolver.validate() {
            Err(PlanError::CircularDependency(path)) => assert_eq!(path, "1 -> 3 -> 2 -> 1"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let tasks = vec![task(1, &[1])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        assert!(matches!(
            resolver.validate(),
            Err(PlanError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let tasks = vec![task(1, &[]), task(1, &[])];
        assert!(matches!(
            DependencyResolver::new(&tasks),
            Err(PlanError::DuplicateTaskId(1))
        ));
    }

    #[test]
    fn test_ready_tasks_wait_for_dependencies() {
        let tasks = vec![task(1, &[]), task(2, &[1])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        let ready: Vec<TaskId> = resolver.ready_tasks().iter().map(|t| t.id).collect();
        assert_eq!(ready, vec![1]);

        let tasks = vec![completed(1, &[]), task(2, &[1])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        let ready: Vec<TaskId> = resolver.ready_tasks().iter().map(|t| t.id).collect();
        assert_eq!(ready, vec![2]);
    }

    #[test]
    fn test_dangling_dependency_never_ready() {
        let tasks = vec![task(1, &[]), task(2, &[9])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        assert!(resolver.validate().is_ok());
        assert!(!resolver.can_execute(&tasks[1]));
        assert_eq!(resolver.first_unmet_dependency(&tasks[1]), Some(9));
    }

    #[test]
    fn test_unsatisfiable_dependency() {
        let mut skipped = task(1, &[]);
        skipped.skip().unwrap();
        let tasks = vec![skipped, task(2, &[]), task(3, &[2, 1]), task(4, &[2]), task(5, &[7])];
        let resolver = DependencyResolver::new(&tasks).unwrap();

        assert_eq!(resolver.unsatisfiable_dependency(&tasks[2]), Some(1));
        // Task 2 is still pending, so task 4 can wait for it.
        assert_eq!(resolver.unsatisfiable_dependency(&tasks[3]), None);
        assert_eq!(resolver.unsatisfiable_dependency(&tasks[4]), Some(7));
    }

    #[test]
    fn test_topological_order_is_stable() {
        let tasks = vec![task(1, &[3]), task(2, &[]), task(3, &[]), task(4, &[1, 2])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        assert_eq!(resolver.topological_order().unwrap(), vec![2, 3, 1, 4]);

        let independent = vec![task(1, &[]), task(2, &[]), task(3, &[])];
        let resolver = DependencyResolver::new(&independent).unwrap();
        assert_eq!(resolver.topological_order().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_critical_path() {
        let tasks = vec![
            task(1, &[]),
            task(2, &[1]),
            task(3, &[1]),
            task(4, &[2, 3]),
            task(5, &[]),
        ];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        assert_eq!(resolver.critical_path(), vec![1, 2, 4]);
        assert_eq!(resolver.dependents_of(1), vec![2, 3]);

        let stats = resolver.stats();
        assert_eq!(stats.total_tasks, 5);
        assert_eq!(stats.tasks_with_dependencies, 3);
        assert!(stats.to_string().contains("Critical path: 1 -> 2 -> 4"));
    }

    #[test]
    fn test_critical_path_without_dependencies() {
        let tasks = vec![task(1, &[]), task(2, &[])];
        let resolver = DependencyResolver::new(&tasks).unwrap();
        assert_eq!(resolver.critical_path(), vec![1]);
    }
}
