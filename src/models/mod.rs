//! Scheduling domain models.
//!
//! Core data types for the engine: tasks, workers, and the static
//! precedence graph that relates them. Per-run countdown state (remaining
//! blockers, worker attachments) is deliberately *not* part of these
//! models — it lives in the scheduler's private working copy so a failed
//! run cannot corrupt the live registry.

mod graph;
mod task;
mod worker;

pub use graph::{DependencyGraph, GraphError};
pub use task::{Task, TaskId};
pub use worker::{is_valid_email, Worker, WorkerId};
