//! # Command-Line Interface
//!
//! User-facing `tg` commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init` |
//! | Task | Editing the task list | `add`, `edit`, `start`, `done`, `fail`, `dep`, `remove` |
//! | Query | Reading the graph | `list`, `show`, `agenda`, `next-id` |
//! | Exchange | Whole task lists | `export`, `import` |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! `--verbose` (or `-v`) turns on debug logging on stderr; otherwise the
//! level comes from `TASKGRAPH_LOG`.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod logging;
mod output;
mod query;
mod task;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
