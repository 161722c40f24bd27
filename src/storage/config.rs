//! Configuration handling for taskgraph
//!
//! Configuration is stored in `.taskgraph/config.toml` (project) and
//! `~/.config/taskgraph/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Progress;

use super::project::DATA_DIR;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Agenda settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgendaConfig {
    /// Tasks whose deadline is closer than this sort first
    pub urgency_window_hours: i64,

    /// Progress states listed in the agenda
    pub actionable: Vec<Progress>,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            urgency_window_hours: 24,
            actionable: Progress::ACTIONABLE.to_vec(),
        }
    }
}

impl AgendaConfig {
    /// The urgency window as a duration
    pub fn window(&self) -> Result<Duration, ConfigError> {
        Duration::try_hours(self.urgency_window_hours).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "agenda.urgency_window_hours is too large, got {}",
                self.urgency_window_hours
            ))
        })
    }

    /// Checks the values a TOML file cannot constrain
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urgency_window_hours < 0 {
            return Err(ConfigError::Invalid(format!(
                "agenda.urgency_window_hours must not be negative, got {}",
                self.urgency_window_hours
            )));
        }
        self.window()?;
        if self.actionable.contains(&Progress::Blocked) {
            return Err(ConfigError::Invalid(
                "agenda.actionable cannot list 'blocked' tasks".to_string(),
            ));
        }
        Ok(())
    }
}

/// Display settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Text shown for a date that is never reached
    pub never_label: String,

    /// Write `tasks.json` indented
    pub pretty_json: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            never_label: crate::domain::NEVER.to_string(),
            pretty_json: true,
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub agenda: AgendaConfig,
    pub display: DisplayConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "taskgraph", "taskgraph")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(DATA_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        Self::parse_project_config(&content).context("Failed to parse project config")
    }

    fn parse_project_config(content: &str) -> Result<ProjectConfig, ConfigError> {
        let config: ProjectConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.agenda.validate()?;
        Ok(config)
    }

    /// Finds the project root by looking for `.taskgraph/` from the current directory up
    pub fn find_project_root() -> Option<PathBuf> {
        Self::find_project_root_from(&std::env::current_dir().ok()?)
    }

    /// Finds the project root by looking for `.taskgraph/` from `start` up
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(DATA_DIR).is_dir())
            .map(Path::to_path_buf)
    }
}
