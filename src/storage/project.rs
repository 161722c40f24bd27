//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use super::{Config, TaskStore};

/// Name of the per-project data directory
pub const DATA_DIR: &str = ".taskgraph";

/// Data directory of the project rooted at `root`
pub(crate) fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

const DEFAULT_CONFIG: &str = r#"# taskgraph configuration

[agenda]
# Tasks whose deadline is closer than this many hours are listed first
urgency_window_hours = 24

# Progress states listed by 'tg agenda'
actionable = ["todo", "doing"]

[display]
# Text shown for a deadline that is never reached
never_label = "never"

# Write tasks.json indented (false writes a single line)
pretty_json = true
"#;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Not in a taskgraph project. Run 'tg init' first.")]
    NotInProject,
}

/// A taskgraph project
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !data_dir(&root).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Fails if the path already holds a project.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let dir = data_dir(&root);

        if dir.is_dir() {
            return Err(ProjectError::AlreadyExists(root).into());
        }

        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {} directory: {}", DATA_DIR, dir.display()))?;

        let config_path = dir.join("config.toml");
        fs::write(&config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

        let gitignore_path = dir.join(".gitignore");
        fs::write(&gitignore_path, "# Leftovers of interrupted writes\n*.tmp\n").with_context(|| {
            format!("Failed to write .gitignore: {}", gitignore_path.display())
        })?;

        info!(root = %root.display(), "initialized project");
        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .taskgraph directory path
    pub fn data_dir(&self) -> PathBuf {
        data_dir(&self.root)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the task store
    pub fn task_store(&self) -> TaskStore {
        TaskStore::for_project(&self.root)
    }
}
