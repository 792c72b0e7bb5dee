//! Static precedence graph.
//!
//! Keeps the dependency relation between tasks as two symmetric edge sets
//! addressed by task id: `prerequisites` (tasks that must complete first)
//! and `dependents` (the inverse). The graph is never consumed by a
//! scheduling run — the simulation works on its own countdown copy — so it
//! stays valid for UI queries, diagnostics, and persistence between runs.
//!
//! `BTreeMap`/`BTreeSet` keep iteration order deterministic, which the
//! scheduler relies on for reproducible timelines.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::TaskId;

/// Edge-layer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Referenced task id is not registered.
    #[error("unknown task id {0}")]
    UnknownTask(TaskId),
    /// A task may not be its own prerequisite.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),
    /// The edge already exists.
    #[error("task {task} already depends on task {prerequisite}")]
    DuplicateEdge { task: TaskId, prerequisite: TaskId },
    /// The edge does not exist.
    #[error("task {task} does not depend on task {prerequisite}")]
    MissingEdge { task: TaskId, prerequisite: TaskId },
}

/// Symmetric precedence relation over registered task ids.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    prerequisites: BTreeMap<TaskId, BTreeSet<TaskId>>,
    dependents: BTreeMap<TaskId, BTreeSet<TaskId>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task id with no edges. Idempotent.
    pub fn insert_node(&mut self, id: TaskId) {
        self.prerequisites.entry(id).or_default();
        self.dependents.entry(id).or_default();
    }

    /// Unregisters a task id, detaching all incident edges.
    pub fn remove_node(&mut self, id: TaskId) {
        if let Some(prereqs) = self.prerequisites.remove(&id) {
            for p in prereqs {
                if let Some(deps) = self.dependents.get_mut(&p) {
                    deps.remove(&id);
                }
            }
        }
        if let Some(deps) = self.dependents.remove(&id) {
            for d in deps {
                if let Some(prereqs) = self.prerequisites.get_mut(&d) {
                    prereqs.remove(&id);
                }
            }
        }
    }

    /// Whether the id is registered.
    pub fn contains(&self, id: TaskId) -> bool {
        self.prerequisites.contains_key(&id)
    }

    /// Number of registered task ids.
    pub fn node_count(&self) -> usize {
        self.prerequisites.len()
    }

    /// Registered task ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.prerequisites.keys().copied()
    }

    /// Makes `prerequisite` a blocker of `task`, updating both directions.
    pub fn add_edge(&mut self, task: TaskId, prerequisite: TaskId) -> Result<(), GraphError> {
        if task == prerequisite {
            return Err(GraphError::SelfDependency(task));
        }
        if !self.contains(prerequisite) {
            return Err(GraphError::UnknownTask(prerequisite));
        }
        let prereqs = self
            .prerequisites
            .get_mut(&task)
            .ok_or(GraphError::UnknownTask(task))?;
        if !prereqs.insert(prerequisite) {
            return Err(GraphError::DuplicateEdge { task, prerequisite });
        }
        self.dependents.entry(prerequisite).or_default().insert(task);
        Ok(())
    }

    /// Removes the blocker edge, updating both directions.
    pub fn remove_edge(&mut self, task: TaskId, prerequisite: TaskId) -> Result<(), GraphError> {
        if !self.contains(prerequisite) {
            return Err(GraphError::UnknownTask(prerequisite));
        }
        let prereqs = self
            .prerequisites
            .get_mut(&task)
            .ok_or(GraphError::UnknownTask(task))?;
        if !prereqs.remove(&prerequisite) {
            return Err(GraphError::MissingEdge { task, prerequisite });
        }
        if let Some(deps) = self.dependents.get_mut(&prerequisite) {
            deps.remove(&task);
        }
        Ok(())
    }

    /// Tasks that must complete before `id` may start.
    pub fn prerequisites(&self, id: TaskId) -> Option<&BTreeSet<TaskId>> {
        self.prerequisites.get(&id)
    }

    /// Tasks blocked (directly) by `id`.
    pub fn dependents(&self, id: TaskId) -> Option<&BTreeSet<TaskId>> {
        self.dependents.get(&id)
    }

    /// Number of blockers of `id` (0 for unknown ids).
    pub fn prerequisite_count(&self, id: TaskId) -> usize {
        self.prerequisites.get(&id).map_or(0, BTreeSet::len)
    }

    /// Whether any registered task has zero prerequisites.
    ///
    /// A graph without such an entry point cannot be scheduled.
    pub fn has_entry_point(&self) -> bool {
        self.prerequisites.values().any(BTreeSet::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(nodes: &[TaskId]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for &n in nodes {
            g.insert_node(n);
        }
        g
    }

    #[test]
    fn test_add_edge_symmetric() {
        let mut g = graph_with(&[1, 2]);
        g.add_edge(2, 1).unwrap();
        assert!(g.prerequisites(2).unwrap().contains(&1));
        assert!(g.dependents(1).unwrap().contains(&2));
        assert_eq!(g.prerequisite_count(2), 1);
        assert_eq!(g.prerequisite_count(1), 0);
    }

    #[test]
    fn test_remove_edge_symmetric() {
        let mut g = graph_with(&[1, 2]);
        g.add_edge(2, 1).unwrap();
        g.remove_edge(2, 1).unwrap();
        assert!(g.prerequisites(2).unwrap().is_empty());
        assert!(g.dependents(1).unwrap().is_empty());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut g = graph_with(&[1]);
        assert_eq!(g.add_edge(1, 1), Err(GraphError::SelfDependency(1)));
    }

    #[test]
    fn test_unknown_task_rejected() {
        let mut g = graph_with(&[1]);
        assert_eq!(g.add_edge(1, 9), Err(GraphError::UnknownTask(9)));
        assert_eq!(g.add_edge(9, 1), Err(GraphError::UnknownTask(9)));
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let mut g = graph_with(&[1, 2]);
        g.add_edge(2, 1).unwrap();
        assert_eq!(
            g.add_edge(2, 1),
            Err(GraphError::DuplicateEdge {
                task: 2,
                prerequisite: 1
            })
        );
    }

    #[test]
    fn test_missing_edge_rejected() {
        let mut g = graph_with(&[1, 2]);
        assert_eq!(
            g.remove_edge(2, 1),
            Err(GraphError::MissingEdge {
                task: 2,
                prerequisite: 1
            })
        );
    }

    #[test]
    fn test_remove_node_detaches_edges() {
        let mut g = graph_with(&[1, 2, 3]);
        g.add_edge(2, 1).unwrap();
        g.add_edge(3, 2).unwrap();
        g.remove_node(2);
        assert!(!g.contains(2));
        assert!(g.dependents(1).unwrap().is_empty());
        assert!(g.prerequisites(3).unwrap().is_empty());
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn test_entry_point_detection() {
        let mut g = graph_with(&[1, 2]);
        assert!(g.has_entry_point());
        g.add_edge(2, 1).unwrap();
        assert!(g.has_entry_point());
        g.add_edge(1, 2).unwrap(); // two-node cycle
        assert!(!g.has_entry_point());
        assert!(!graph_with(&[]).has_entry_point());
    }
}
