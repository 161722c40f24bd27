//! Domain models for taskgraph
//!
//! Contains the dependency graph, its propagation rules and the agenda
//! ordering, without any I/O concerns.

mod id;
mod date;
mod task;
mod graph;
mod agenda;
mod manager;

pub use id::{IdError, TaskId};
pub use date::{DateError, MaybeDate, NEVER};
pub use task::{Progress, RawTask, Task};
pub use graph::{GraphError, JsonStyle, TaskGraph};
pub use agenda::{compare_tasks, Urgency};
pub use manager::TaskManager;
