//! Task CLI commands that change the task list
//!
//! Every command loads the stored tasks into a [`TaskManager`], applies its
//! edit and writes the result back only if the graph could be rebuilt.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::output::Output;
use super::query::task_json;
use crate::domain::{GraphError, MaybeDate, Progress, RawTask, TaskId, TaskManager};
use crate::storage::Project;

/// Fields of a task being added
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub deadline: Option<MaybeDate>,
    pub birthline: Option<MaybeDate>,
    pub after: Vec<TaskId>,
}

/// Fields to change on an existing task; `None` leaves a field as it is
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub deadline: Option<MaybeDate>,
    pub birthline: Option<MaybeDate>,
}

impl TaskChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
            && self.birthline.is_none()
    }
}

/// Loads the project's tasks, applies `edit` and saves if it succeeded
fn edit_tasks<T>(edit: impl FnOnce(&mut TaskManager) -> Result<T>) -> Result<(TaskManager, T)> {
    let project = Project::open_current()?;
    let store = project.task_store();

    let mut manager = store.load()?;
    let value = edit(&mut manager)?;

    store.save(&manager, project.config().project.display.pretty_json)?;
    debug!(tasks = manager.records().len(), "task list updated");

    Ok((manager, value))
}

pub fn add(output: &Output, new: NewTask) -> Result<()> {
    let mut record = RawTask::new(TaskId::new(0), new.name);
    record.description = new.description.unwrap_or_default();
    record.priority = new.priority.unwrap_or_default();
    record.deadline = new.deadline.unwrap_or_default();
    record.birthline = new.birthline.unwrap_or_default();
    record.dependencies = new.after;

    let (manager, id) = edit_tasks(|manager| Ok(manager.insert(record)?))?;
    let graph = manager.graph();
    let task = graph.get(id).ok_or(GraphError::TaskNotFound(id))?;

    if output.is_json() {
        output.data(&task_json(task, graph));
    } else {
        output.success(&format!("Created task {}: {}", task.id, task.name));
        if task.is_blocked() {
            println!("Waiting on: {}", join_ids(&task.depends_on));
        }
    }

    Ok(())
}

pub fn edit(output: &Output, id: TaskId, changes: TaskChanges) -> Result<()> {
    if changes.is_empty() {
        anyhow::bail!(
            "Nothing to change; pass at least one of --name, --description, --priority, --deadline, --birthline"
        );
    }

    let (manager, ()) = edit_tasks(|manager| {
        if let Some(name) = changes.name {
            manager.set_name(id, name)?;
        }
        if let Some(description) = changes.description {
            manager.set_description(id, description)?;
        }
        if let Some(priority) = changes.priority {
            manager.set_priority(id, priority)?;
        }
        if let Some(deadline) = changes.deadline {
            manager.set_deadline(id, deadline)?;
        }
        if let Some(birthline) = changes.birthline {
            manager.set_birthline(id, birthline)?;
        }
        Ok(())
    })?;

    let graph = manager.graph();
    let task = graph.get(id).ok_or(GraphError::TaskNotFound(id))?;

    if output.is_json() {
        output.data(&task_json(task, graph));
    } else {
        output.success(&format!("Updated task {}: {}", task.id, task.name));
    }

    Ok(())
}

pub fn set_progress(output: &Output, id: TaskId, progress: Progress) -> Result<()> {
    let (manager, unblocked) = edit_tasks(|manager| {
        let blocked: Vec<TaskId> = manager
            .graph()
            .tasks_by_progress(Progress::Blocked)
            .iter()
            .map(|task| task.id)
            .collect();

        manager.set_progress(id, progress)?;

        let graph = manager.graph();
        Ok(blocked
            .into_iter()
            .filter(|blocked_id| graph.get(*blocked_id).is_some_and(|task| !task.is_blocked()))
            .collect::<Vec<_>>())
    })?;

    let graph = manager.graph();
    let task = graph.get(id).ok_or(GraphError::TaskNotFound(id))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "progress": task.progress,
            "unblocked": unblocked,
        }));
    } else {
        let verb = match progress {
            Progress::Doing => "Started",
            Progress::Done => "Completed",
            Progress::Failed => "Failed",
            Progress::Todo | Progress::Blocked => "Reopened",
        };
        output.success(&format!("{} task {}: {}", verb, task.id, task.name));

        if task.is_blocked() {
            println!("Still waiting on dependencies");
        }
        for unblocked_id in &unblocked {
            if let Some(ready) = graph.get(*unblocked_id) {
                println!("Unblocked {}: {}", ready.id, ready.name);
            }
        }
    }

    Ok(())
}

pub fn add_dependency(output: &Output, task_id: TaskId, depends_on: TaskId) -> Result<()> {
    edit_tasks(|manager| {
        if !manager.graph().contains(depends_on) {
            anyhow::bail!("Dependency task not found: {}", depends_on);
        }
        Ok(manager.add_dependency(task_id, depends_on)?)
    })?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id,
            "depends_on": depends_on,
        }));
    } else {
        output.success(&format!("{} now depends on {}", task_id, depends_on));
    }

    Ok(())
}

pub fn remove_dependency(output: &Output, task_id: TaskId, depends_on: TaskId) -> Result<()> {
    edit_tasks(|manager| Ok(manager.remove_dependency(task_id, depends_on)?))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id,
            "removed_dependency": depends_on,
        }));
    } else {
        output.success(&format!(
            "Removed dependency: {} no longer depends on {}",
            task_id, depends_on
        ));
    }

    Ok(())
}

pub fn remove(output: &Output, id: TaskId) -> Result<()> {
    let (_, removed) = edit_tasks(|manager| {
        let dependents = manager.graph().dependents(id);
        if !dependents.is_empty() {
            anyhow::bail!(
                "Task {} is needed by {}; remove those dependencies first",
                id,
                join_ids(&dependents)
            );
        }
        Ok(manager.remove(id)?)
    })?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "removed": removed.id,
            "name": removed.name,
        }));
    } else {
        output.success(&format!("Removed task {}: {}", removed.id, removed.name));
    }

    Ok(())
}

pub fn import(output: &Output, file: &Path) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.task_store();

    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let manager = TaskManager::from_json(&text)
        .with_context(|| format!("Invalid task list in {}", file.display()))?;

    store.save(&manager, project.config().project.display.pretty_json)?;

    let count = manager.records().len();
    if output.is_json() {
        output.data(&serde_json::json!({ "imported": count }));
    } else {
        output.success(&format!("Imported {} task(s) from {}", count, file.display()));
    }

    Ok(())
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}
