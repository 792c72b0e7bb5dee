//! Greedy scheduling engine for teams.
//!
//! Assigns a pool of interchangeable workers to a dependency-ordered set
//! of tasks, producing a feasible timeline that respects precedence
//! constraints and rewards collaboration on a task with a throughput
//! bonus. The engine is a heuristic: it simulates discrete rounds,
//! greedily staffing the highest-priority ready tasks, and fails fast on
//! graphs it cannot drain.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Task`, `Worker`, `DependencyGraph`
//! - **`collaboration`**: Crew-size → throughput-multiplier curve
//! - **`dispatch`**: The candidate priority order
//! - **`scheduler`**: The discrete-time engine and its published results
//! - **`validation`**: Structural diagnostics (cycles, missing entry point)
//! - **`store`**: JSON snapshot persistence
//!
//! # Example
//!
//! ```
//! use team_schedule::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! let a = scheduler.add_task("spec", 1.0);
//! let b = scheduler.add_task("implement", 3.0);
//! scheduler.add_dependency(b, a)?;
//! scheduler.add_worker("Ada", "ada@example.com");
//! scheduler.add_worker("Grace", "grace@example.com");
//!
//! scheduler.produce_schedule()?;
//! assert_eq!(scheduler.timeline().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod collaboration;
pub mod dispatch;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use models::{DependencyGraph, GraphError, Task, TaskId, Worker, WorkerId};
pub use scheduler::{CacheState, ScheduleError, Scheduler, TimelineEntry};
pub use store::{Snapshot, StoreError};
