//! Structural diagnostics for the precedence graph.
//!
//! The engine itself never pre-checks for cycles — an unschedulable graph
//! surfaces through the round bound, exactly once, at run time. These
//! checks exist for callers that want a diagnosis *before* running (a
//! dependency editor, a snapshot importer): they name the offending task,
//! which the round bound cannot.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
//! (Topological Sort)

use std::collections::BTreeSet;

use crate::models::{DependencyGraph, TaskId};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A structural problem in the precedence graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of structural problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The precedence relation contains a directed cycle.
    CyclicDependency,
    /// Every task has at least one prerequisite; nothing can ever start.
    NoEntryPoint,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the precedence graph.
///
/// Checks:
/// 1. At least one task has zero prerequisites (non-empty graphs only).
/// 2. No directed cycle exists.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate(graph: &DependencyGraph) -> ValidationResult {
    let mut errors = Vec::new();

    if graph.node_count() > 0 && !graph.has_entry_point() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoEntryPoint,
            "every task has at least one prerequisite",
        ));
    }

    if let Some(cycle_err) = detect_cycles(graph) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles with a DFS over the dependent (successor) relation.
///
/// A back edge — reaching a task already on the recursion stack — proves a
/// cycle.
fn detect_cycles(graph: &DependencyGraph) -> Option<ValidationError> {
    let mut visited = BTreeSet::new();
    let mut in_stack = BTreeSet::new();

    for node in graph.nodes() {
        if !visited.contains(&node) && has_cycle_dfs(node, graph, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("circular dependency involving task {node}"),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: TaskId,
    graph: &DependencyGraph,
    visited: &mut BTreeSet<TaskId>,
    in_stack: &mut BTreeSet<TaskId>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(dependents) = graph.dependents(node) {
        for &next in dependents {
            if in_stack.contains(&next) {
                return true;
            }
            if !visited.contains(&next) && has_cycle_dfs(next, graph, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(nodes: &[TaskId], edges: &[(TaskId, TaskId)]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for &n in nodes {
            g.insert_node(n);
        }
        for &(task, prerequisite) in edges {
            g.add_edge(task, prerequisite).unwrap();
        }
        g
    }

    #[test]
    fn test_empty_graph_is_valid() {
        assert!(validate(&DependencyGraph::new()).is_ok());
    }

    #[test]
    fn test_chain_is_valid() {
        let g = graph_with(&[1, 2, 3], &[(2, 1), (3, 2)]);
        assert!(validate(&g).is_ok());
    }

    #[test]
    fn test_diamond_is_valid() {
        let g = graph_with(&[1, 2, 3, 4], &[(2, 1), (3, 1), (4, 2), (4, 3)]);
        assert!(validate(&g).is_ok());
    }

    #[test]
    fn test_two_node_cycle_detected() {
        let g = graph_with(&[1, 2], &[(2, 1), (1, 2)]);
        let errors = validate(&g).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicDependency));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NoEntryPoint));
    }

    #[test]
    fn test_embedded_cycle_detected() {
        // 1 → 2 → 3 → 4 with 4 → 2 closing a loop; 1 is still an entry.
        let g = graph_with(&[1, 2, 3, 4], &[(2, 1), (3, 2), (4, 3), (2, 4)]);
        let errors = validate(&g).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::CyclicDependency);
    }

    #[test]
    fn test_disconnected_components() {
        let g = graph_with(&[1, 2, 10, 11], &[(2, 1), (11, 10)]);
        assert!(validate(&g).is_ok());
    }
}
