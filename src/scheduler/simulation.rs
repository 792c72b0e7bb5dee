//! Discrete-time working copy of one scheduling run.
//!
//! The live registry is never simulated directly. Each run builds an
//! index-based arena: one row per task with its remaining-prerequisite set
//! expressed as row indices, plus successor index lists for unblocking.
//! A structural copy of the id-addressed data is all that is needed — no
//! deep clone of linked task objects — and a failed run simply drops the
//! arena, leaving the caller's registry untouched.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::engine::ScheduleError;
use crate::collaboration::reduction;
use crate::dispatch::{self, CandidateRank};
use crate::models::{TaskId, WorkerId};

/// Input row for one task in the working copy.
#[derive(Debug, Clone)]
pub(crate) struct SimSpec {
    pub id: TaskId,
    pub effort: f64,
    pub prerequisites: Vec<TaskId>,
}

/// Result row for one task after a successful run.
#[derive(Debug, Clone)]
pub(crate) struct CompletedTask {
    pub id: TaskId,
    pub start: u32,
    pub reduction: f64,
    pub effort: f64,
}

/// Everything a successful run publishes.
#[derive(Debug, Clone)]
pub(crate) struct RunOutcome {
    /// Started tasks ordered by start time (ties keep discovery order).
    pub timeline: Vec<CompletedTask>,
    /// Per worker, the tasks it was attached to, in attachment order.
    pub history: Vec<(WorkerId, Vec<TaskId>)>,
}

struct SimTask {
    id: TaskId,
    effort: f64,
    /// Row indices of prerequisites not yet completed. Consumed as the
    /// run progresses; the live graph is unaffected.
    remaining: BTreeSet<usize>,
    successors: Vec<usize>,
    started_at: Option<u32>,
    reduction: f64,
    done: bool,
}

/// One scheduling run over an isolated arena.
pub(crate) struct Simulation {
    tasks: Vec<SimTask>,
    workers: Vec<WorkerId>,
    /// Worker slot → arena row the worker is attached to.
    assignment: Vec<Option<usize>>,
    /// Worker slot → attachment history, parallel to `workers`.
    history: Vec<Vec<TaskId>>,
}

impl Simulation {
    pub(crate) fn new(specs: Vec<SimSpec>, workers: Vec<WorkerId>) -> Self {
        let index_of: HashMap<TaskId, usize> = specs
            .iter()
            .enumerate()
            .map(|(row, spec)| (spec.id, row))
            .collect();

        let mut tasks: Vec<SimTask> = specs
            .iter()
            .map(|spec| SimTask {
                id: spec.id,
                effort: spec.effort,
                remaining: BTreeSet::new(),
                successors: Vec::new(),
                started_at: None,
                reduction: 1.0,
                done: false,
            })
            .collect();

        for (row, spec) in specs.iter().enumerate() {
            for prerequisite in &spec.prerequisites {
                if let Some(&p) = index_of.get(prerequisite) {
                    tasks[row].remaining.insert(p);
                    tasks[p].successors.push(row);
                }
            }
        }

        let slot_count = workers.len();
        Self {
            tasks,
            workers,
            assignment: vec![None; slot_count],
            history: vec![Vec::new(); slot_count],
        }
    }

    /// Runs the simulation to completion or failure.
    ///
    /// Each round polls the surviving tasks in priority order. A ready,
    /// unstarted task claims one idle worker; a ready, started task is
    /// checked for completion under the *current* crew's reduction factor.
    /// Workers freed by a completion are reusable later in the same round.
    /// After the pass, leftover idle workers are spread round-robin over
    /// the tasks that started this round, letting crews form.
    pub(crate) fn run(mut self) -> Result<RunOutcome, ScheduleError> {
        let round_bound = self.tasks.len() as u32 * 100 + 1;
        let mut pending = self.tasks.len();
        let mut started_order: Vec<usize> = Vec::new();
        let mut t: u32 = 0;

        while pending > 0 {
            let order = self.poll_order();
            let mut newly_started: Vec<usize> = Vec::new();

            for row in order {
                // Readiness is re-checked at poll time: a completion
                // earlier in this round may already have unblocked us.
                if !self.tasks[row].remaining.is_empty() {
                    continue;
                }
                match self.tasks[row].started_at {
                    None => {
                        if let Some(slot) = self.idle_slot() {
                            self.attach(slot, row);
                            self.tasks[row].started_at = Some(t);
                            newly_started.push(row);
                            debug!(task = self.tasks[row].id, round = t, "task started");
                        }
                    }
                    Some(start) => {
                        let crew = self.crew_size(row);
                        let factor = reduction(crew);
                        self.tasks[row].reduction = factor;
                        if (t - start) as f64 >= self.tasks[row].effort * factor {
                            self.complete(row);
                            pending -= 1;
                            debug!(task = self.tasks[row].id, round = t, crew, "task completed");
                        }
                    }
                }
            }

            if !newly_started.is_empty() {
                let mut next = 0;
                for slot in 0..self.assignment.len() {
                    if self.assignment[slot].is_none() {
                        self.attach(slot, newly_started[next]);
                        next = (next + 1) % newly_started.len();
                    }
                }
                started_order.extend_from_slice(&newly_started);
            }

            t += 1;
            if t > round_bound {
                return Err(ScheduleError::RoundBoundExceeded { rounds: t });
            }
        }

        let mut timeline: Vec<CompletedTask> = started_order
            .iter()
            .map(|&row| {
                let task = &self.tasks[row];
                CompletedTask {
                    id: task.id,
                    start: task.started_at.expect("recorded when started"),
                    reduction: task.reduction,
                    effort: task.effort,
                }
            })
            .collect();
        timeline.sort_by_key(|c| c.start);

        let history = self.workers.into_iter().zip(self.history).collect();
        Ok(RunOutcome { timeline, history })
    }

    /// Surviving rows in priority order: fewest remaining blockers first,
    /// then lowest effort, stable among equals.
    fn poll_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.tasks.len())
            .filter(|&row| !self.tasks[row].done)
            .collect();
        order.sort_by(|&a, &b| dispatch::compare(self.rank(a), self.rank(b)));
        order
    }

    fn rank(&self, row: usize) -> CandidateRank {
        CandidateRank {
            remaining: self.tasks[row].remaining.len(),
            effort: self.tasks[row].effort,
        }
    }

    fn idle_slot(&self) -> Option<usize> {
        self.assignment.iter().position(Option::is_none)
    }

    fn attach(&mut self, slot: usize, row: usize) {
        self.assignment[slot] = Some(row);
        self.history[slot].push(self.tasks[row].id);
    }

    fn crew_size(&self, row: usize) -> usize {
        self.assignment
            .iter()
            .filter(|slot| **slot == Some(row))
            .count()
    }

    fn complete(&mut self, row: usize) {
        self.tasks[row].done = true;
        for slot in &mut self.assignment {
            if *slot == Some(row) {
                *slot = None;
            }
        }
        let successors = std::mem::take(&mut self.tasks[row].successors);
        for s in successors {
            self.tasks[s].remaining.remove(&row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: TaskId, effort: f64, prerequisites: &[TaskId]) -> SimSpec {
        SimSpec {
            id,
            effort,
            prerequisites: prerequisites.to_vec(),
        }
    }

    #[test]
    fn test_single_task_single_worker() {
        let sim = Simulation::new(vec![spec(0, 1.0, &[])], vec![100]);
        let outcome = sim.run().unwrap();
        assert_eq!(outcome.timeline.len(), 1);
        assert_eq!(outcome.timeline[0].start, 0);
        assert!((outcome.timeline[0].reduction - 1.0).abs() < 1e-10);
        assert_eq!(outcome.history, vec![(100, vec![0])]);
    }

    #[test]
    fn test_crew_forms_and_speeds_up() {
        // One task, three workers: the two leftovers co-staff at round 0,
        // so the crew of 3 finishes 5.0 effort in 4 rounds.
        let sim = Simulation::new(vec![spec(0, 5.0, &[])], vec![10, 11, 12]);
        let outcome = sim.run().unwrap();
        let entry = &outcome.timeline[0];
        assert_eq!(entry.start, 0);
        assert!((entry.reduction - 0.8).abs() < 1e-10);
        for (_, tasks) in &outcome.history {
            assert_eq!(tasks, &vec![0]);
        }
    }

    #[test]
    fn test_freed_worker_reused_in_same_round() {
        // Chain 0 → 1 with one worker: 0 completes in the round-1 pass and
        // the freed worker starts 1 later in that same pass.
        let sim = Simulation::new(vec![spec(0, 1.0, &[]), spec(1, 1.0, &[0])], vec![7]);
        let outcome = sim.run().unwrap();
        assert_eq!(outcome.timeline[0].start, 0);
        assert_eq!(outcome.timeline[1].start, 1);
        assert_eq!(outcome.history, vec![(7, vec![0, 1])]);
    }

    #[test]
    fn test_two_node_cycle_hits_round_bound() {
        let sim = Simulation::new(
            vec![spec(0, 1.0, &[1]), spec(1, 1.0, &[0]), spec(2, 1.0, &[])],
            vec![7],
        );
        match sim.run() {
            Err(ScheduleError::RoundBoundExceeded { .. }) => {}
            other => panic!("expected round bound failure, got {other:?}"),
        }
    }

    #[test]
    fn test_self_prerequisite_hits_round_bound() {
        // Unreachable through the edge API, but a hand-built arena (or a
        // corrupted snapshot) must still fail via the bound.
        let sim = Simulation::new(vec![spec(0, 10.0, &[0])], vec![7]);
        match sim.run() {
            Err(ScheduleError::RoundBoundExceeded { rounds }) => {
                assert_eq!(rounds, 102); // 1 task * 100 + 1, exceeded by one
            }
            other => panic!("expected round bound failure, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_task_waits_for_idle_worker() {
        // Two independent tasks, one worker: the lower-effort task runs
        // first, the other starts once the worker frees up.
        let sim = Simulation::new(vec![spec(0, 2.0, &[]), spec(1, 1.0, &[])], vec![7]);
        let outcome = sim.run().unwrap();
        assert_eq!(outcome.timeline[0].id, 1);
        assert_eq!(outcome.timeline[0].start, 0);
        assert_eq!(outcome.timeline[1].id, 0);
        assert_eq!(outcome.timeline[1].start, 1);
    }
}
