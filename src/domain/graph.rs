//! Dependency graph for tasks
//!
//! A [`TaskGraph`] is built once from a complete list of records and is
//! immutable afterwards. Construction validates the graph (every dependency
//! exists, no cycles) and propagates urgency and blocking state along the
//! dependency edges. Changing a task means building a new graph from the
//! changed records (see [`TaskManager`](super::TaskManager)).
//!
//! Tasks live in a petgraph arena; edges point from a dependency to the task
//! that needs it, so "outgoing" neighbours are dependents.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::id::TaskId;
use super::task::{Progress, RawTask, Task};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Reference to non-existent task ({task} --> {dependency})")]
    DanglingReference { task: TaskId, dependency: TaskId },

    #[error("Circular dependencies between tasks [{}]", join_ids(.0))]
    Cycle(Vec<TaskId>),

    #[error("Cannot read task list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

/// Layout of the serialized task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// Indented, one field per line
    #[default]
    Pretty,
    /// Single line
    Compact,
}

/// Traversal state of a node during propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Visited,
}

/// A node whose dependents are being walked
struct Frame {
    node: NodeIndex,
    dependents: Vec<NodeIndex>,
    next: usize,
}

/// A validated, fully propagated dependency graph
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Tasks in input order; edge direction is dependency -> dependent
    graph: DiGraph<Task, ()>,

    /// Map from TaskId to node index
    nodes: HashMap<TaskId, NodeIndex>,

    /// Tasks without dependencies, in input order
    roots: Vec<NodeIndex>,
}

impl TaskGraph {
    /// Creates an empty graph
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds, validates and propagates a graph from a full list of records
    ///
    /// A record whose ID was already seen replaces the earlier one and keeps
    /// its position.
    pub fn new(records: impl IntoIterator<Item = RawTask>) -> Result<Self, GraphError> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<TaskId, NodeIndex> = HashMap::new();

        // First pass: one node per record
        for raw in records {
            let task = Task::from_raw(raw);
            match nodes.get(&task.id) {
                Some(&idx) => {
                    warn!(id = %task.id, "duplicate task id, keeping the last record");
                    graph[idx] = task;
                }
                None => {
                    let id = task.id;
                    let idx = graph.add_node(task);
                    nodes.insert(id, idx);
                }
            }
        }

        let roots: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&idx| graph[idx].is_root())
            .collect();

        // Second pass: resolve dependencies into edges
        for idx in graph.node_indices() {
            let task_id = graph[idx].id;
            let dependencies = graph[idx].depends_on.clone();
            for dependency in dependencies {
                let dep_idx = *nodes.get(&dependency).ok_or(GraphError::DanglingReference {
                    task: task_id,
                    dependency,
                })?;
                graph.add_edge(dep_idx, idx, ());
            }
        }

        let mut task_graph = Self { graph, nodes, roots };

        // Every task has a dependency, so following dependencies never ends
        if !task_graph.is_empty() && task_graph.roots.is_empty() {
            return Err(task_graph.cycle_error());
        }

        task_graph.propagate()?;

        debug!(
            tasks = task_graph.len(),
            roots = task_graph.roots.len(),
            edges = task_graph.graph.edge_count(),
            "built task graph"
        );

        Ok(task_graph)
    }

    /// Parses a serialized task list and builds a graph from it
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let records: Vec<RawTask> = serde_json::from_str(json)?;
        Self::new(records)
    }

    /// Serializes the declared records in minimal form
    pub fn to_json(&self, style: JsonStyle) -> Result<String, GraphError> {
        let records = self.to_raw_tasks();
        let json = match style {
            JsonStyle::Pretty => serde_json::to_string_pretty(&records)?,
            JsonStyle::Compact => serde_json::to_string(&records)?,
        };
        Ok(json)
    }

    /// The declared records, in input order
    pub fn to_raw_tasks(&self) -> Vec<RawTask> {
        self.tasks().map(Task::to_raw).collect()
    }

    /// Pushes urgency from dependents down to their dependencies and
    /// blocking/failure from dependencies up to their dependents
    fn propagate(&mut self) -> Result<(), GraphError> {
        let mut colors = vec![Color::Unvisited; self.graph.node_count()];

        for root in self.roots.clone() {
            self.visit(root, &mut colors)?;
        }

        // Whatever was not reached from a root sits on (or behind) a cycle
        if colors.iter().any(|color| *color != Color::Visited) {
            return Err(self.cycle_error());
        }

        Ok(())
    }

    /// Depth-first walk over dependents starting at `start`
    fn visit(&mut self, start: NodeIndex, colors: &mut [Color]) -> Result<(), GraphError> {
        if !self.enter(start, false, colors)? {
            return Ok(());
        }

        let mut stack = vec![self.frame(start)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let next = frame.dependents.get(frame.next).copied();

            match next {
                Some(dependent) => {
                    let changed = self.push_progress(node, dependent);
                    if self.enter(dependent, changed, colors)? {
                        let frame = self.frame(dependent);
                        stack.push(frame);
                    } else {
                        self.absorb(node, dependent);
                        if let Some(frame) = stack.last_mut() {
                            frame.next += 1;
                        }
                    }
                }
                None => {
                    colors[node.index()] = Color::Visited;
                    stack.pop();
                    if let Some(parent) = stack.last_mut() {
                        parent.next += 1;
                        let parent_node = parent.node;
                        self.absorb(parent_node, node);
                    }
                }
            }
        }

        Ok(())
    }

    /// Marks a node as entered; returns false if its branch ends here
    ///
    /// A visited node is walked again when its progress just `changed`, so
    /// that a late block or failure still reaches everything below it.
    /// Progress only ever moves towards `failed`, which bounds the re-walks.
    fn enter(
        &self,
        idx: NodeIndex,
        changed: bool,
        colors: &mut [Color],
    ) -> Result<bool, GraphError> {
        let color = colors[idx.index()];
        if color == Color::InProgress {
            return Err(self.cycle_error());
        }

        let settled = color == Color::Visited && !changed;
        if settled || !self.has_dependents(idx) {
            colors[idx.index()] = Color::Visited;
            return Ok(false);
        }

        colors[idx.index()] = Color::InProgress;
        Ok(true)
    }

    fn frame(&self, node: NodeIndex) -> Frame {
        Frame {
            node,
            dependents: self.dependents_of(node),
            next: 0,
        }
    }

    /// Blocks or fails `dependent` according to the progress of `dependency`
    ///
    /// Returns true if the progress of `dependent` changed.
    fn push_progress(&mut self, dependency: NodeIndex, dependent: NodeIndex) -> bool {
        let progress = self.graph[dependency].progress;
        let task = &mut self.graph[dependent];
        let before = task.progress;

        if !progress.is_done() && !task.progress.is_failed() {
            task.progress = Progress::Blocked;
        }
        if progress.is_failed() {
            task.progress = Progress::Failed;
        }

        let after = task.progress;
        trace!(
            dependency = %self.graph[dependency].id,
            dependent = %self.graph[dependent].id,
            progress = %after,
            "pushed progress"
        );
        before != after
    }

    /// Folds the effective values of `dependent` into `dependency`
    fn absorb(&mut self, dependency: NodeIndex, dependent: NodeIndex) {
        let priority = self.graph[dependent].effective_priority;
        let deadline = self.graph[dependent].effective_deadline;
        let task = &mut self.graph[dependency];

        task.effective_priority = task.effective_priority.max(priority);
        task.effective_deadline = task.effective_deadline.earliest(deadline);
    }

    /// Builds a cycle error naming the tasks on the cycle(s)
    fn cycle_error(&self) -> GraphError {
        let mut ids: Vec<TaskId> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.graph.contains_edge(component[0], component[0])
            })
            .flatten()
            .map(|idx| self.graph[idx].id)
            .collect();
        ids.sort();

        GraphError::Cycle(ids)
    }

    fn has_dependents(&self, idx: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .next()
            .is_some()
    }

    /// Dependents of a node, one entry per edge, in the order edges were added
    pub(super) fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.sort_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Number of dependency edges into each node, indexed by node index
    pub(super) fn in_degrees(&self) -> Vec<usize> {
        self.graph
            .node_indices()
            .map(|idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .count()
            })
            .collect()
    }

    pub(super) fn root_nodes(&self) -> &[NodeIndex] {
        &self.roots
    }

    pub(super) fn node(&self, idx: NodeIndex) -> &Task {
        &self.graph[idx]
    }

    /// All tasks, in input order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.graph.node_weights()
    }

    /// All tasks with exactly the given progress, in input order
    pub fn tasks_by_progress(&self, progress: Progress) -> Vec<&Task> {
        self.tasks().filter(|task| task.progress == progress).collect()
    }

    /// Looks up a task by ID
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.nodes.get(&id).map(|&idx| &self.graph[idx])
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// IDs of the tasks without dependencies, in input order
    pub fn roots(&self) -> Vec<TaskId> {
        self.roots.iter().map(|&idx| self.graph[idx].id).collect()
    }

    /// Direct dependencies of a task, as declared
    pub fn dependencies(&self, id: TaskId) -> Vec<TaskId> {
        self.get(id)
            .map(|task| task.depends_on.clone())
            .unwrap_or_default()
    }

    /// Direct dependents of a task (tasks that need it), in input order
    pub fn dependents(&self, id: TaskId) -> Vec<TaskId> {
        let Some(&idx) = self.nodes.get(&id) else {
            return vec![];
        };

        let mut ids: Vec<TaskId> = Vec::new();
        for dependent in self.dependents_of(idx) {
            let dependent_id = self.graph[dependent].id;
            if !ids.contains(&dependent_id) {
                ids.push(dependent_id);
            }
        }
        ids
    }

    /// Smallest non-negative ID not used by any task
    pub fn smallest_available_id(&self) -> TaskId {
        TaskId::smallest_unused(self.nodes.keys())
    }
}
