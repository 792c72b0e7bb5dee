//! Task model.
//!
//! A task is a unit of work with a nominal effort cost. Precedence
//! relations between tasks live in the [`DependencyGraph`], not on the
//! task itself, so the static graph survives a scheduling run intact.
//!
//! [`DependencyGraph`]: super::DependencyGraph

use serde::{Deserialize, Serialize};

/// Unique task identifier, allocated by the scheduler.
pub type TaskId = u32;

/// A unit of work to be scheduled.
///
/// `start_time` and `reduction` are run state: they are reset at the start
/// of every scheduling run and written back only by a successful one.
/// Equality compares ids only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// Human-readable name (display only).
    pub name: String,
    /// Nominal work units (positive).
    pub effort: f64,
    /// Start time assigned by the last successful run. `None` = unscheduled.
    pub start_time: Option<f64>,
    /// Collaboration multiplier last applied to this task (1.0 = solo pace).
    pub reduction: f64,
}

impl Task {
    /// Creates a task with the given id, name, and effort.
    pub fn new(id: TaskId, name: impl Into<String>, effort: f64) -> Self {
        Self {
            id,
            name: name.into(),
            effort,
            start_time: None,
            reduction: 1.0,
        }
    }

    /// Whether the last successful run assigned this task a start time.
    pub fn is_scheduled(&self) -> bool {
        self.start_time.is_some()
    }

    /// Clears run state ahead of a new scheduling run.
    pub(crate) fn reset_run_state(&mut self) {
        self.start_time = None;
        self.reduction = 1.0;
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_unscheduled() {
        let t = Task::new(0, "design", 3.5);
        assert_eq!(t.id, 0);
        assert_eq!(t.name, "design");
        assert!((t.effort - 3.5).abs() < 1e-10);
        assert_eq!(t.start_time, None);
        assert!((t.reduction - 1.0).abs() < 1e-10);
        assert!(!t.is_scheduled());
    }

    #[test]
    fn test_equality_by_id() {
        let a = Task::new(1, "a", 1.0);
        let b = Task::new(1, "b", 9.0);
        let c = Task::new(2, "a", 1.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_reset_run_state() {
        let mut t = Task::new(3, "t", 2.0);
        t.start_time = Some(4.0);
        t.reduction = 0.8;
        t.reset_run_state();
        assert_eq!(t.start_time, None);
        assert!((t.reduction - 1.0).abs() < 1e-10);
    }
}
