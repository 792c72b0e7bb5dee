//! Snapshot persistence for tasks and workers.
//!
//! A snapshot captures the registry as flat records: ids, names, efforts,
//! contact addresses, and — for each task — the ids of its *dependents*.
//! Only that one side of every edge is written; `restore` re-derives the
//! prerequisite side, so both directions are populated before the first
//! run. Run state (start times, reductions) is never persisted: a restored
//! scheduler always starts `Dirty` and owes its caller a fresh run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{GraphError, Task, TaskId, Worker, WorkerId};
use crate::scheduler::Scheduler;

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a well-formed snapshot.
    #[error("malformed snapshot: {0}")]
    Format(#[from] serde_json::Error),
    /// The snapshot decoded but its records contradict each other
    /// (unknown ids in an edge list, a task depending on itself).
    #[error("inconsistent snapshot: {0}")]
    Corrupt(#[from] GraphError),
}

/// Persisted form of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub effort: f64,
    /// Ids of the tasks that list this one as a prerequisite.
    #[serde(default)]
    pub dependents: Vec<TaskId>,
}

/// Persisted form of one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A complete, self-contained copy of the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Vec<TaskRecord>,
    pub workers: Vec<WorkerRecord>,
}

impl Snapshot {
    /// Captures the scheduler's registry.
    pub fn capture(scheduler: &Scheduler) -> Self {
        let tasks = scheduler
            .tasks()
            .map(|task| TaskRecord {
                id: task.id,
                name: task.name.clone(),
                effort: task.effort,
                dependents: scheduler.dependents_of(task.id),
            })
            .collect();
        let workers = scheduler
            .workers()
            .map(|worker| WorkerRecord {
                id: worker.id,
                name: worker.name.clone(),
                email: worker.email.clone(),
            })
            .collect();
        Self { tasks, workers }
    }

    /// Rebuilds a scheduler from the records.
    ///
    /// All tasks and workers are registered first, then the edges, so the
    /// order of records does not matter. Id allocators resume past the
    /// highest persisted id.
    pub fn restore(&self) -> Result<Scheduler, StoreError> {
        let mut scheduler = Scheduler::new();
        for record in &self.tasks {
            scheduler.restore_task(Task::new(record.id, record.name.clone(), record.effort));
        }
        for record in &self.workers {
            let mut worker = Worker::new(record.id, record.name.clone());
            worker.email = record.email.clone();
            scheduler.restore_worker(worker);
        }
        for record in &self.tasks {
            for &dependent in &record.dependents {
                scheduler.add_dependency(dependent, record.id)?;
            }
        }
        debug!(
            tasks = self.tasks.len(),
            workers = self.workers.len(),
            "snapshot restored"
        );
        Ok(scheduler)
    }
}

/// Writes the scheduler's registry to `path` as pretty-printed JSON.
pub fn save_file(scheduler: &Scheduler, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let snapshot = Snapshot::capture(scheduler);
    fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    Ok(())
}

/// Reads a snapshot from `path` and rebuilds the scheduler.
pub fn load_file(path: impl AsRef<Path>) -> Result<Scheduler, StoreError> {
    let snapshot: Snapshot = serde_json::from_str(&fs::read_to_string(path)?)?;
    snapshot.restore()
}
