//! Main CLI application structure

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use super::logging::init_logging;
use super::output::{Output, OutputFormat};
use super::{query, task};
use crate::domain::{MaybeDate, Progress, TaskId};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "tg")]
#[command(author, version, about = "Local-first task dependency tracking")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskgraph project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Add a task under the smallest free ID
    Add {
        /// Task name
        name: String,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 'p', allow_negative_numbers = true)]
        priority: Option<i32>,

        /// Deadline (YYYY-MM-DD, RFC 3339 or "never")
        #[arg(long)]
        deadline: Option<MaybeDate>,

        /// Earliest start (YYYY-MM-DD, RFC 3339 or "never")
        #[arg(long)]
        birthline: Option<MaybeDate>,

        /// Tasks that must be done first
        #[arg(long = "after", value_name = "ID")]
        after: Vec<TaskId>,
    },

    /// List tasks
    List {
        /// Only list tasks with this progress
        #[arg(long)]
        progress: Option<Progress>,
    },

    /// Show task details
    Show {
        id: TaskId,
    },

    /// Show what to work on next, in order
    Agenda {
        /// Reference time (defaults to now)
        #[arg(long)]
        now: Option<MaybeDate>,

        /// Deadlines closer than this many hours count as due
        #[arg(long)]
        window_hours: Option<i64>,
    },

    /// Change task fields
    Edit {
        id: TaskId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 'p', allow_negative_numbers = true)]
        priority: Option<i32>,

        #[arg(long)]
        deadline: Option<MaybeDate>,

        #[arg(long)]
        birthline: Option<MaybeDate>,
    },

    /// Mark task as in progress
    Start {
        id: TaskId,
    },

    /// Mark task as done
    Done {
        id: TaskId,
    },

    /// Mark task as failed
    Fail {
        id: TaskId,
    },

    /// Mark task as not started
    Reopen {
        id: TaskId,
    },

    /// Add a dependency between tasks
    Dep {
        /// Task that will wait
        task: TaskId,

        /// Task that must be completed first
        depends_on: TaskId,
    },

    /// Remove a dependency
    Undep {
        task: TaskId,

        depends_on: TaskId,
    },

    /// Remove a task nothing depends on
    Remove {
        id: TaskId,
    },

    /// Print the ID the next added task will get
    NextId,

    /// Print all tasks in their serialized form
    Export {
        /// Single line instead of indented
        #[arg(long)]
        compact: bool,
    },

    /// Replace all tasks with the contents of a file
    Import {
        file: PathBuf,
    },
}

/// Main entry point for the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: {:#}", e);
    }

    let output = Output::new(cli.format.unwrap_or_else(default_format));

    match execute(cli.command, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn default_format() -> OutputFormat {
    match Config::load_global() {
        Ok(global) => global.default_format.into(),
        Err(e) => {
            warn!("Ignoring global config: {:#}", e);
            OutputFormat::default()
        }
    }
}

fn execute(command: Commands, output: &Output) -> Result<()> {
    match command {
        Commands::Init { path } => {
            debug!(path = %path.display(), "initializing project");
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized taskgraph project at {}",
                project.root().display()
            ));
            Ok(())
        }

        Commands::Add {
            name,
            description,
            priority,
            deadline,
            birthline,
            after,
        } => task::add(
            output,
            task::NewTask {
                name,
                description,
                priority,
                deadline,
                birthline,
                after,
            },
        ),

        Commands::List { progress } => query::list(output, progress),
        Commands::Show { id } => query::show(output, id),
        Commands::Agenda { now, window_hours } => query::agenda(output, now, window_hours),

        Commands::Edit {
            id,
            name,
            description,
            priority,
            deadline,
            birthline,
        } => task::edit(
            output,
            id,
            task::TaskChanges {
                name,
                description,
                priority,
                deadline,
                birthline,
            },
        ),

        Commands::Start { id } => task::set_progress(output, id, Progress::Doing),
        Commands::Done { id } => task::set_progress(output, id, Progress::Done),
        Commands::Fail { id } => task::set_progress(output, id, Progress::Failed),
        Commands::Reopen { id } => task::set_progress(output, id, Progress::Todo),

        Commands::Dep { task, depends_on } => task::add_dependency(output, task, depends_on),
        Commands::Undep { task, depends_on } => task::remove_dependency(output, task, depends_on),
        Commands::Remove { id } => task::remove(output, id),

        Commands::NextId => query::next_id(output),
        Commands::Export { compact } => query::export(compact),
        Commands::Import { file } => task::import(output, &file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_options() {
        let cli = Cli::try_parse_from([
            "tg", "add", "cook lunch", "--priority", "-2", "--deadline", "2030-01-30", "--after",
            "1", "--after", "#2",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                name,
                priority,
                deadline,
                after,
                ..
            } => {
                assert_eq!(name, "cook lunch");
                assert_eq!(priority, Some(-2));
                assert_eq!(deadline, MaybeDate::ymd(2030, 1, 30));
                assert_eq!(after, vec![TaskId::new(1), TaskId::new(2)]);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["tg", "show", "abc"]).is_err());
        assert!(Cli::try_parse_from(["tg", "list", "--progress", "later"]).is_err());
        assert!(Cli::try_parse_from(["tg", "add", "x", "--deadline", "soon"]).is_err());
    }

    #[test]
    fn format_is_global() {
        let cli = Cli::try_parse_from(["tg", "next-id", "--format", "json"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }
}
