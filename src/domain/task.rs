//! Task domain model
//!
//! [`RawTask`] is the record exchanged with the outside world (storage,
//! import/export). [`Task`] is the resolved node owned by a
//! [`TaskGraph`](super::TaskGraph): the declared fields plus the values
//! derived from its dependencies.

use serde::{Deserialize, Serialize};

use super::date::MaybeDate;
use super::id::TaskId;

/// Progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    /// At least one dependency is not done yet (derived, never declared)
    Blocked,
    #[default]
    Todo,
    #[serde(alias = "started")]
    Doing,
    Done,
    Failed,
}

impl Progress {
    /// All progress states, in display order
    pub const ALL: [Progress; 5] = [
        Progress::Blocked,
        Progress::Todo,
        Progress::Doing,
        Progress::Done,
        Progress::Failed,
    ];

    /// Progress states listed in the agenda by default
    pub const ACTIONABLE: [Progress; 2] = [Progress::Todo, Progress::Doing];

    /// Returns true if this progress represents completion
    pub fn is_done(&self) -> bool {
        matches!(self, Progress::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Progress::Failed)
    }

    /// Returns true if work can happen on a task in this state
    pub fn is_actionable(&self) -> bool {
        Self::ACTIONABLE.contains(self)
    }

    /// Returns a display label for the progress
    pub fn label(&self) -> &'static str {
        match self {
            Progress::Blocked => "blocked",
            Progress::Todo => "todo",
            Progress::Doing => "doing",
            Progress::Done => "done",
            Progress::Failed => "failed",
        }
    }

    /// Drops the blocked state: a task cannot be blocked on its own
    pub fn declared(self) -> Self {
        match self {
            Progress::Blocked => Progress::Todo,
            other => other,
        }
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Progress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocked" => Ok(Progress::Blocked),
            "todo" => Ok(Progress::Todo),
            "doing" | "started" => Ok(Progress::Doing),
            "done" => Ok(Progress::Done),
            "failed" => Ok(Progress::Failed),
            other => Err(format!(
                "unknown progress '{}' (expected blocked, todo, doing, done or failed)",
                other
            )),
        }
    }
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// A task as stored and exchanged
///
/// Fields equal to their default are left out when serializing, so the
/// serialized form of a record is its minimal canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTask {
    pub id: TaskId,

    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "is_default")]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "MaybeDate::is_never")]
    pub deadline: MaybeDate,

    /// Earliest start; carried through, not used for ordering
    #[serde(default, skip_serializing_if = "MaybeDate::is_never")]
    pub birthline: MaybeDate,

    #[serde(default, skip_serializing_if = "is_default")]
    pub progress: Progress,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,
}

impl RawTask {
    /// Creates a record with the given ID and name and every other field defaulted
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            priority: 0,
            deadline: MaybeDate::Never,
            birthline: MaybeDate::Never,
            progress: Progress::Todo,
            dependencies: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: MaybeDate) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Adds a dependency unless it is already listed
    pub fn add_dependency(&mut self, dependency: TaskId) -> bool {
        if self.dependencies.contains(&dependency) {
            return false;
        }
        self.dependencies.push(dependency);
        true
    }

    /// Removes every occurrence of a dependency
    pub fn remove_dependency(&mut self, dependency: TaskId) -> bool {
        let len_before = self.dependencies.len();
        self.dependencies.retain(|d| *d != dependency);
        self.dependencies.len() != len_before
    }

    /// Same record with the declared state normalized (`blocked` becomes `todo`)
    pub fn normalized(mut self) -> Self {
        self.progress = self.progress.declared();
        self
    }
}

/// A task resolved inside a graph
///
/// `effective_priority` and `effective_deadline` start out equal to the
/// declared values and only ever move towards more urgency: the priority
/// up, the deadline earlier. `progress` is the declared progress adjusted
/// by the state of the dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub deadline: MaybeDate,
    pub birthline: MaybeDate,
    pub progress: Progress,
    pub effective_priority: i32,
    pub effective_deadline: MaybeDate,
    /// IDs this task needs, in declared order
    pub depends_on: Vec<TaskId>,
    /// Progress as declared in the record (never `blocked`)
    declared_progress: Progress,
}

impl Task {
    /// Seeds a task from a record; effective values equal the declared ones
    pub fn from_raw(raw: RawTask) -> Self {
        let progress = raw.progress.declared();
        Self {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            priority: raw.priority,
            deadline: raw.deadline,
            birthline: raw.birthline,
            progress,
            effective_priority: raw.priority,
            effective_deadline: raw.deadline,
            depends_on: raw.dependencies,
            declared_progress: progress,
        }
    }

    /// The declared record this task was built from
    ///
    /// Derived state (`blocked`, inherited `failed`, effective values) is
    /// not part of the record, so rebuilding from it reproduces this task.
    pub fn to_raw(&self) -> RawTask {
        RawTask {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            priority: self.priority,
            deadline: self.deadline,
            birthline: self.birthline,
            progress: self.declared_progress,
            dependencies: self.depends_on.clone(),
        }
    }

    /// Progress as declared, before dependencies were taken into account
    pub fn declared_progress(&self) -> Progress {
        self.declared_progress
    }

    pub fn is_root(&self) -> bool {
        self.depends_on.is_empty()
    }

    pub fn is_blocked(&self) -> bool {
        self.progress == Progress::Blocked
    }
}
