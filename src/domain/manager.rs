//! Editing tasks by rebuilding the graph
//!
//! A [`TaskManager`] holds the current list of records together with the
//! graph built from it. Every edit is applied to a copy of the records and a
//! new graph is built from that copy; only if the build succeeds do the
//! records and the graph get replaced. A failed edit leaves the manager
//! exactly as it was.

use tracing::debug;

use super::date::MaybeDate;
use super::graph::{GraphError, JsonStyle, TaskGraph};
use super::id::TaskId;
use super::task::{Progress, RawTask};

/// Current task list and the graph built from it
#[derive(Debug, Clone, Default)]
pub struct TaskManager {
    records: Vec<RawTask>,
    graph: TaskGraph,
}

impl TaskManager {
    /// Builds a manager from a complete list of records
    pub fn new(records: Vec<RawTask>) -> Result<Self, GraphError> {
        let graph = TaskGraph::new(records.iter().cloned())?;
        // Normalized and deduplicated, in the same order as the graph
        let records = graph.to_raw_tasks();
        Ok(Self { records, graph })
    }

    /// Parses a serialized task list
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let records: Vec<RawTask> = serde_json::from_str(json)?;
        Self::new(records)
    }

    pub fn to_json(&self, style: JsonStyle) -> Result<String, GraphError> {
        self.graph.to_json(style)
    }

    /// The current graph
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// The current records, in listing order
    pub fn records(&self) -> &[RawTask] {
        &self.records
    }

    /// Adds a task with default fields under the smallest free ID
    pub fn add(&mut self, name: impl Into<String>) -> Result<TaskId, GraphError> {
        self.insert(RawTask::new(TaskId::new(0), name))
    }

    /// Adds a fully specified record under the smallest free ID
    ///
    /// The ID of `record` is ignored.
    pub fn insert(&mut self, mut record: RawTask) -> Result<TaskId, GraphError> {
        let id = self.graph.smallest_available_id();
        record.id = id;

        let mut records = self.records.clone();
        records.push(record);
        self.rebuild(records)?;

        Ok(id)
    }

    /// Replaces the record with the same ID, or appends it if there is none
    pub fn upsert(&mut self, record: RawTask) -> Result<(), GraphError> {
        let mut records = self.records.clone();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.rebuild(records)
    }

    /// Removes a task
    ///
    /// Fails if other tasks still depend on it.
    pub fn remove(&mut self, id: TaskId) -> Result<RawTask, GraphError> {
        let mut records = self.records.clone();
        let position = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(GraphError::TaskNotFound(id))?;
        let removed = records.remove(position);

        self.rebuild(records)?;
        Ok(removed)
    }

    pub fn set_name(&mut self, id: TaskId, name: impl Into<String>) -> Result<(), GraphError> {
        let name = name.into();
        self.edit(id, |record| record.name = name)
    }

    pub fn set_description(
        &mut self,
        id: TaskId,
        description: impl Into<String>,
    ) -> Result<(), GraphError> {
        let description = description.into();
        self.edit(id, |record| record.description = description)
    }

    pub fn set_priority(&mut self, id: TaskId, priority: i32) -> Result<(), GraphError> {
        self.edit(id, |record| record.priority = priority)
    }

    pub fn set_deadline(&mut self, id: TaskId, deadline: MaybeDate) -> Result<(), GraphError> {
        self.edit(id, |record| record.deadline = deadline)
    }

    pub fn set_birthline(&mut self, id: TaskId, birthline: MaybeDate) -> Result<(), GraphError> {
        self.edit(id, |record| record.birthline = birthline)
    }

    /// Sets the declared progress (`blocked` is stored as `todo`)
    pub fn set_progress(&mut self, id: TaskId, progress: Progress) -> Result<(), GraphError> {
        self.edit(id, |record| record.progress = progress.declared())
    }

    /// Makes `id` depend on `dependency`
    pub fn add_dependency(&mut self, id: TaskId, dependency: TaskId) -> Result<(), GraphError> {
        self.edit(id, |record| {
            record.add_dependency(dependency);
        })
    }

    pub fn remove_dependency(&mut self, id: TaskId, dependency: TaskId) -> Result<(), GraphError> {
        self.edit(id, |record| {
            record.remove_dependency(dependency);
        })
    }

    /// Applies `change` to a copy of the record with the given ID and rebuilds
    fn edit(&mut self, id: TaskId, change: impl FnOnce(&mut RawTask)) -> Result<(), GraphError> {
        let mut records = self.records.clone();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(GraphError::TaskNotFound(id))?;
        change(record);

        self.rebuild(records)
    }

    fn rebuild(&mut self, records: Vec<RawTask>) -> Result<(), GraphError> {
        let graph = TaskGraph::new(records.iter().cloned())?;
        debug!(tasks = graph.len(), "replaced task graph");

        self.records = graph.to_raw_tasks();
        self.graph = graph;
        Ok(())
    }
}
