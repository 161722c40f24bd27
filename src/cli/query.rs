//! Query commands (list, show, agenda, next-id, export)
//!
//! These commands read the stored tasks and never write them.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use super::output::Output;
use crate::domain::{JsonStyle, MaybeDate, Progress, Task, TaskGraph, TaskId, Urgency};
use crate::storage::Project;

/// JSON view of a resolved task
pub(super) fn task_json(task: &Task, graph: &TaskGraph) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "name": task.name,
        "description": task.description,
        "progress": task.progress,
        "declared_progress": task.declared_progress(),
        "priority": task.priority,
        "effective_priority": task.effective_priority,
        "deadline": task.deadline,
        "effective_deadline": task.effective_deadline,
        "birthline": task.birthline,
        "dependencies": task.depends_on,
        "dependents": graph.dependents(task.id),
    })
}

fn print_table(tasks: &[&Task], never_label: &str) {
    println!("{:<6} {:<8} {:>5} {:<11} NAME", "ID", "PROGRESS", "PRI", "DEADLINE");
    println!("{}", "-".repeat(60));
    for task in tasks {
        println!(
            "{:<6} {:<8} {:>5} {:<11} {}",
            task.id,
            task.progress,
            task.effective_priority,
            task.effective_deadline.display_or(never_label),
            task.name
        );
    }
}

/// List tasks, optionally only those with the given progress
pub fn list(output: &Output, progress: Option<Progress>) -> Result<()> {
    let project = Project::open_current()?;
    let manager = project.task_store().load()?;
    let graph = manager.graph();

    let tasks: Vec<&Task> = match progress {
        Some(progress) => graph.tasks_by_progress(progress),
        None => graph.tasks().collect(),
    };

    if output.is_json() {
        let items: Vec<_> = tasks.iter().map(|task| task_json(task, graph)).collect();
        output.data(&items);
    } else if tasks.is_empty() {
        match progress {
            Some(progress) => println!("No {} tasks", progress),
            None => println!("No tasks"),
        }
    } else {
        print_table(&tasks, &project.config().project.display.never_label);
    }

    Ok(())
}

/// Show one task with its neighbourhood
pub fn show(output: &Output, id: TaskId) -> Result<()> {
    let project = Project::open_current()?;
    let manager = project.task_store().load()?;
    let graph = manager.graph();
    let never_label = &project.config().project.display.never_label;

    let task = graph
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

    if output.is_json() {
        output.data(&task_json(task, graph));
        return Ok(());
    }

    println!("Task: {}", task.id);
    println!("Name: {}", task.name);
    if task.progress == task.declared_progress() {
        println!("Progress: {}", task.progress);
    } else {
        println!("Progress: {} (declared {})", task.progress, task.declared_progress());
    }
    println!("Priority: {} (effective {})", task.priority, task.effective_priority);
    println!(
        "Deadline: {} (effective {})",
        task.deadline.display_or(never_label),
        task.effective_deadline.display_or(never_label)
    );
    if !task.birthline.is_never() {
        println!("Birthline: {}", task.birthline.display_or(never_label));
    }

    let print_neighbours = |title: &str, ids: Vec<TaskId>| {
        if ids.is_empty() {
            return;
        }
        println!("\n{}:", title);
        for neighbour in ids.into_iter().filter_map(|id| graph.get(id)) {
            println!("  {} {} ({})", neighbour.id, neighbour.name, neighbour.progress);
        }
    };
    print_neighbours("Depends on", graph.dependencies(id));
    print_neighbours("Needed by", graph.dependents(id));

    if !task.description.is_empty() {
        println!("\nDescription:");
        println!("{}", task.description);
    }

    Ok(())
}

/// Show actionable tasks in the order they should be worked on
pub fn agenda(output: &Output, now: Option<MaybeDate>, window_hours: Option<i64>) -> Result<()> {
    let project = Project::open_current()?;
    let config = &project.config().project;
    let manager = project.task_store().load()?;
    let graph = manager.graph();

    let now = match now {
        Some(date) => date
            .instant()
            .context("--now must be a date, not 'never'")?,
        None => Utc::now(),
    };
    let window = match window_hours {
        Some(hours) if hours < 0 => anyhow::bail!("--window-hours must not be negative"),
        Some(hours) => Duration::try_hours(hours)
            .with_context(|| format!("--window-hours is too large: {}", hours))?,
        None => config.agenda.window()?,
    };

    let urgency = Urgency::new(now, window);
    let tasks = graph.agenda_with(now, window, &config.agenda.actionable);

    if output.is_json() {
        let items: Vec<_> = tasks
            .iter()
            .map(|task| {
                let mut item = task_json(task, graph);
                item["due"] = serde_json::Value::Bool(urgency.is_due(task));
                item
            })
            .collect();
        output.data(&items);
    } else if tasks.is_empty() {
        println!("Nothing to do.");
    } else {
        let never_label = &config.display.never_label;
        println!("Agenda ({}):", tasks.len());
        println!("{:<6} {:<3} {:>5} {:<11} NAME", "ID", "DUE", "PRI", "DEADLINE");
        println!("{}", "-".repeat(60));
        for task in &tasks {
            println!(
                "{:<6} {:<3} {:>5} {:<11} {}",
                task.id,
                if urgency.is_due(task) { "!" } else { "" },
                task.effective_priority,
                task.effective_deadline.display_or(never_label),
                task.name
            );
        }
    }

    Ok(())
}

/// Print the ID the next added task gets
pub fn next_id(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let manager = project.task_store().load()?;
    let id = manager.graph().smallest_available_id();

    if output.is_json() {
        output.data(&serde_json::json!({ "id": id }));
    } else {
        println!("{}", id);
    }

    Ok(())
}

/// Print the stored tasks in their serialized form
pub fn export(compact: bool) -> Result<()> {
    let project = Project::open_current()?;
    let manager = project.task_store().load()?;

    let style = if compact { JsonStyle::Compact } else { JsonStyle::Pretty };
    println!("{}", manager.to_json(style)?);

    Ok(())
}
