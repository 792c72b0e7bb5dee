//! Scheduler: live registry, cache state machine, run orchestration.
//!
//! The scheduler owns the candidate tasks, the worker pool, and the static
//! precedence graph. Every mutation flips the cache state to [`Dirty`];
//! [`Scheduler::produce_schedule`] on a [`Clean`] state returns the cached
//! result without recomputation. A run simulates over a private working
//! copy, so failure leaves the registry untouched apart from the reset of
//! per-task run state.
//!
//! [`Clean`]: CacheState::Clean
//! [`Dirty`]: CacheState::Dirty

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::simulation::{SimSpec, Simulation};
use crate::models::{DependencyGraph, GraphError, Task, TaskId, Worker, WorkerId};

/// Validity of the last computed timeline relative to the live registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The last timeline reflects the current tasks, workers, and edges.
    Clean,
    /// Something changed since the last successful run (or none ran yet).
    Dirty,
}

/// Failures reported by [`Scheduler::produce_schedule`].
///
/// All are values, none are fatal: the scheduler remains usable for
/// further mutation and retry. Note that retrying with unchanged data
/// deterministically fails again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Every task has at least one prerequisite — nothing can ever start.
    #[error("no task is free of prerequisites; the graph has no entry point")]
    MissingEntryPoint,
    /// There is nobody to do the work.
    #[error("the worker pool is empty")]
    NoWorkers,
    /// The simulation failed to drain within the round bound. The graph is
    /// presumed cyclic or otherwise unschedulable; the engine does not
    /// distinguish the causes.
    #[error("no feasible schedule within {rounds} rounds; the graph is presumed cyclic or unschedulable")]
    RoundBoundExceeded { rounds: u32 },
}

/// One row of the published timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Scheduled task.
    pub task: TaskId,
    /// Task name at the time the schedule was produced.
    pub name: String,
    /// Assigned start time.
    pub start: f64,
    /// Effective duration: effort scaled by the final collaboration factor.
    pub duration: f64,
}

/// The scheduling engine.
///
/// # Example
///
/// ```
/// use team_schedule::Scheduler;
///
/// let mut scheduler = Scheduler::new();
/// let design = scheduler.add_task("design", 2.0);
/// let build = scheduler.add_task("build", 4.0);
/// scheduler.add_dependency(build, design).unwrap();
/// scheduler.add_worker("Ada", "ada@example.com");
///
/// scheduler.produce_schedule().unwrap();
/// let starts: Vec<f64> = scheduler.timeline().iter().map(|e| e.start).collect();
/// assert_eq!(starts, vec![0.0, 2.0]);
/// ```
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: BTreeMap<TaskId, Task>,
    workers: BTreeMap<WorkerId, Worker>,
    graph: DependencyGraph,
    next_task_id: TaskId,
    next_worker_id: WorkerId,
    dirty: bool,
    timeline: Vec<TimelineEntry>,
    history: BTreeMap<WorkerId, Vec<TaskId>>,
}

impl Scheduler {
    /// Creates an empty scheduler. The initial state is [`CacheState::Dirty`]:
    /// no timeline has been computed yet.
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    // ---- registry mutation ------------------------------------------------

    /// Registers a task with a fresh unique id.
    pub fn add_task(&mut self, name: impl Into<String>, effort: f64) -> TaskId {
        let id = self.next_task_id;
        self.next_task_id += 1;
        self.tasks.insert(id, Task::new(id, name, effort));
        self.graph.insert_node(id);
        self.invalidate();
        debug!(task = id, effort, "task added");
        id
    }

    /// Registers a worker with a fresh unique id. The contact address is
    /// kept only if it is a well-formed e-mail address.
    pub fn add_worker(&mut self, name: impl Into<String>, contact: impl Into<String>) -> WorkerId {
        let id = self.next_worker_id;
        self.next_worker_id += 1;
        self.workers
            .insert(id, Worker::new(id, name).with_contact(contact));
        self.invalidate();
        debug!(worker = id, "worker added");
        id
    }

    /// Removes a task and every edge incident to it. Must only be called
    /// between runs.
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let removed = self.tasks.remove(&id);
        if removed.is_some() {
            self.graph.remove_node(id);
            self.invalidate();
            debug!(task = id, "task removed");
        }
        removed
    }

    /// Removes a worker from the pool.
    pub fn remove_worker(&mut self, id: WorkerId) -> Option<Worker> {
        let removed = self.workers.remove(&id);
        if removed.is_some() {
            self.invalidate();
            debug!(worker = id, "worker removed");
        }
        removed
    }

    /// Makes `prerequisite` a blocker of `task`.
    ///
    /// Rejects self-dependencies, duplicates, and unknown ids at the edge
    /// layer. A cycle built out of individually valid edges is *not*
    /// detected here; it surfaces when [`Self::produce_schedule`] hits the
    /// round bound (callers adding edges speculatively should roll back on
    /// failure), or earlier through [`crate::validation::validate`].
    pub fn add_dependency(&mut self, task: TaskId, prerequisite: TaskId) -> Result<(), GraphError> {
        self.graph.add_edge(task, prerequisite)?;
        self.invalidate();
        debug!(task, prerequisite, "dependency added");
        Ok(())
    }

    /// Removes the blocker edge between `task` and `prerequisite`.
    pub fn remove_dependency(
        &mut self,
        task: TaskId,
        prerequisite: TaskId,
    ) -> Result<(), GraphError> {
        self.graph.remove_edge(task, prerequisite)?;
        self.invalidate();
        debug!(task, prerequisite, "dependency removed");
        Ok(())
    }

    /// Flags the cached timeline as stale, forcing the next
    /// [`Self::produce_schedule`] to recompute.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    // ---- queries ----------------------------------------------------------

    /// Cache validity of the last computed timeline.
    pub fn state(&self) -> CacheState {
        if self.dirty {
            CacheState::Dirty
        } else {
            CacheState::Clean
        }
    }

    /// Looks up a task by id.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Looks up a worker by id.
    pub fn worker(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.get(&id)
    }

    /// All tasks in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// All workers in id order.
    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    /// Number of candidate tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// The static precedence graph (for diagnostics and UI queries).
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Ids of the tasks that must complete before `id` may start.
    pub fn dependencies_of(&self, id: TaskId) -> Vec<TaskId> {
        self.graph
            .prerequisites(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids of the tasks directly blocked by `id`.
    pub fn dependents_of(&self, id: TaskId) -> Vec<TaskId> {
        self.graph
            .dependents(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    // ---- scheduling -------------------------------------------------------

    /// Computes a feasible timeline, or returns the cached one when the
    /// registry is unchanged since the last success.
    ///
    /// On failure the registry content is untouched (run state is reset,
    /// nothing else) and the state stays [`CacheState::Dirty`].
    pub fn produce_schedule(&mut self) -> Result<(), ScheduleError> {
        if !self.dirty {
            debug!("timeline cache is clean; skipping recomputation");
            return Ok(());
        }
        if !self.graph.has_entry_point() {
            warn!("scheduling failed: no task is free of prerequisites");
            return Err(ScheduleError::MissingEntryPoint);
        }
        if self.workers.is_empty() {
            warn!("scheduling failed: the worker pool is empty");
            return Err(ScheduleError::NoWorkers);
        }

        self.timeline.clear();
        self.history.clear();
        for task in self.tasks.values_mut() {
            task.reset_run_state();
        }

        let specs: Vec<SimSpec> = self
            .tasks
            .values()
            .map(|task| SimSpec {
                id: task.id,
                effort: task.effort,
                prerequisites: self.dependencies_of(task.id),
            })
            .collect();
        let workers: Vec<WorkerId> = self.workers.keys().copied().collect();

        match Simulation::new(specs, workers).run() {
            Ok(outcome) => {
                for completed in &outcome.timeline {
                    if let Some(task) = self.tasks.get_mut(&completed.id) {
                        task.start_time = Some(f64::from(completed.start));
                        task.reduction = completed.reduction;
                    }
                }
                self.timeline = outcome
                    .timeline
                    .iter()
                    .map(|c| TimelineEntry {
                        task: c.id,
                        name: self
                            .tasks
                            .get(&c.id)
                            .map(|t| t.name.clone())
                            .unwrap_or_default(),
                        start: f64::from(c.start),
                        duration: c.effort * c.reduction,
                    })
                    .collect();
                self.history = outcome.history.into_iter().collect();
                self.dirty = false;
                info!(
                    tasks = self.timeline.len(),
                    makespan = self.makespan(),
                    "schedule produced"
                );
                Ok(())
            }
            Err(error) => {
                warn!(%error, "scheduling failed");
                Err(error)
            }
        }
    }

    // ---- results ----------------------------------------------------------

    /// The published timeline, ordered by start time.
    ///
    /// Valid only after a successful run; empty or stale before the first
    /// success.
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// Per-worker task attachment history from the last successful run.
    pub fn assignment_history(&self) -> &BTreeMap<WorkerId, Vec<TaskId>> {
        &self.history
    }

    /// Latest completion time in the published timeline (0.0 when empty).
    pub fn makespan(&self) -> f64 {
        self.timeline
            .iter()
            .map(|e| e.start + e.duration)
            .fold(0.0, f64::max)
    }

    // ---- persistence support ----------------------------------------------

    /// Re-registers a persisted task under its original id, bumping the id
    /// allocator past it.
    pub(crate) fn restore_task(&mut self, task: Task) {
        let id = task.id;
        self.graph.insert_node(id);
        self.tasks.insert(id, task);
        self.next_task_id = self.next_task_id.max(id + 1);
        self.dirty = true;
    }

    /// Re-registers a persisted worker under its original id, bumping the
    /// id allocator past it.
    pub(crate) fn restore_worker(&mut self, worker: Worker) {
        let id = worker.id;
        self.workers.insert(id, worker);
        self.next_worker_id = self.next_worker_id.max(id + 1);
        self.dirty = true;
    }
}
