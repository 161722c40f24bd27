//! # Storage Layer
//!
//! Persistence for taskgraph projects in git-friendly files.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSON array of records | `.taskgraph/tasks.json` |
//! | Config | TOML | `.taskgraph/config.toml` |
//!
//! [`TaskStore`] takes a shared lock for reads and an exclusive lock for
//! writes (`fs2`); every write goes to a temp file that is then renamed.

mod store;
mod config;
mod project;

pub use store::TaskStore;
pub use config::{
    AgendaConfig, Config, ConfigError, DisplayConfig, GlobalConfig, OutputFormat, ProjectConfig,
};
pub use project::{Project, ProjectError, DATA_DIR};
