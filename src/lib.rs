//! taskgraph - Local-first task dependency tracking
//!
//! Tasks declare which other tasks they depend on. The resulting graph
//! pushes urgency (priority and deadline) down to the tasks everything else
//! is waiting for, marks tasks blocked or failed according to their
//! dependencies, and yields an agenda of what can be worked on next.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{MaybeDate, Progress, RawTask, Task, TaskGraph, TaskId, TaskManager};
