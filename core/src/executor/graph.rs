use std::collections::{HashMap, HashSet};

use crate::batch::TaskLike;
use crate::error::ExecutorError;

/// Dependency graph over a batch of tasks.
///
/// Dependency-free batches degenerate to a single stage; `blocked_by`
/// support is the legacy layer kept for older task files.
#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskLike> {
    /// Task nodes: task_id -> task
    pub nodes: HashMap<String, T>,

    /// Blocking edges: task_id -> ids it is blocked by
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> ids blocked by it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Original insertion order (for stable stage ordering)
    insertion_order: Vec<String>,
}

impl<T: TaskLike> TaskGraph<T> {
    pub fn from_tasks(tasks: &[T]) -> Result<Self, ExecutorError> {
        let mut nodes = HashMap::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in tasks {
            if nodes.contains_key(task.id()) {
                return Err(ExecutorError::DuplicateTaskId(task.id().to_string()));
            }

            let task_id = task.id().to_string();
            let blockers = task.blocked_by().to_vec();

            nodes.insert(task_id.clone(), task.clone());
            edges.insert(task_id.clone(), blockers.clone());
            insertion_order.push(task_id.clone());

            for dep in blockers {
                reverse_edges.entry(dep).or_default().push(task_id.clone());
            }
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    /// Validate structural invariants before anything runs: every blocker
    /// must name a task in the batch and the blocking relation must be
    /// acyclic. Any violation rejects the batch atomically.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        for (task_id, blockers) in &self.edges {
            for dep in blockers {
                if !self.nodes.contains_key(dep) {
                    return Err(ExecutorError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(ExecutorError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Kahn's algorithm: returns execution stages where tasks in the same
    /// stage have no ordering constraints among themselves.
    pub fn topological_sort(&self) -> Result<Vec<Vec<String>>, ExecutorError> {
        let mut in_degree: HashMap<String, usize> = HashMap::new();

        for task_id in self.nodes.keys() {
            in_degree.insert(task_id.clone(), 0);
        }

        // edges[A] = [B, C] means A is blocked by B and C, so A's
        // in-degree in the execution graph is 2.
        for (task_id, blockers) in &self.edges {
            *in_degree.get_mut(task_id).unwrap() += blockers.len();
        }

        let mut stages: Vec<Vec<String>> = Vec::new();
        let mut current_stage: Vec<String> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(id, _)| id.clone())
            .collect();

        self.sort_by_insertion(&mut current_stage);

        let mut processed = 0;

        while !current_stage.is_empty() {
            stages.push(current_stage.clone());
            processed += current_stage.len();

            let mut next_stage = Vec::new();

            for task_id in &current_stage {
                if let Some(dependents) = self.reverse_edges.get(task_id) {
                    for dependent in dependents {
                        let degree = in_degree.get_mut(dependent).unwrap();
                        *degree -= 1;

                        if *degree == 0 {
                            next_stage.push(dependent.clone());
                        }
                    }
                }
            }

            self.sort_by_insertion(&mut next_stage);
            current_stage = next_stage;
        }

        if processed != self.nodes.len() {
            return Err(ExecutorError::CircularDependency(
                "unable to complete topological sort (cycle detected)".to_string(),
            ));
        }

        Ok(stages)
    }

    fn sort_by_insertion(&self, ids: &mut [String]) {
        ids.sort_by_key(|id| {
            self.insertion_order
                .iter()
                .position(|k| k == id)
                .unwrap_or(usize::MAX)
        });
    }

    /// DFS with path-stack tracking; returns the cycle path if one exists.
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in self.nodes.keys() {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(stack.join(" -> "));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        if let Some(blockers) = self.edges.get(node) {
            for dep in blockers {
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(dep.clone());
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::TaskRecord;

    fn task(id: &str, blocked_by: &[&str]) -> TaskRecord {
        let mut t = TaskRecord::new(id, format!("run {}", id));
        t.blocked_by = blocked_by.iter().map(|s| s.to_string()).collect();
        t
    }

    #[test]
    fn independent_tasks_form_one_stage() {
        let tasks = vec![task("a", &[]), task("b", &[]), task("c", &[])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        graph.validate().unwrap();
        let stages = graph.topological_sort().unwrap();
        assert_eq!(stages, vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn blockers_come_before_blocked() {
        let tasks = vec![task("a", &[]), task("b", &["a"]), task("c", &["a", "b"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        let stages = graph.topological_sort().unwrap();
        assert_eq!(stages, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let tasks = vec![task("a", &[]), task("a", &[])];
        let err = TaskGraph::from_tasks(&tasks).unwrap_err();
        assert!(matches!(err, ExecutorError::DuplicateTaskId(id) if id == "a"));
    }

    #[test]
    fn unknown_blocker_is_rejected() {
        let tasks = vec![task("a", &["ghost"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        let err = graph.validate().unwrap_err();
        assert!(
            matches!(err, ExecutorError::DependencyNotFound { task_id, missing_dep }
                if task_id == "a" && missing_dep == "ghost")
        );
    }

    #[test]
    fn cycle_is_rejected() {
        let tasks = vec![task("a", &["b"]), task("b", &["a"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, ExecutorError::CircularDependency(_)));
    }
}
