//! Logging setup for `tg` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--verbose` (debug)
//! 2. `TASKGRAPH_LOG` environment variable (e.g. "info", "trace")
//! 3. default to `warn`
//!
//! Log lines go to stderr so that stdout stays parseable in JSON mode.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable holding the log level
pub const LOG_ENV: &str = "TASKGRAPH_LOG";

/// Installs the global logging subscriber
pub fn init_logging(verbose: bool) -> Result<()> {
    let env_level = std::env::var(LOG_ENV).ok();
    let level = resolve_level(verbose, env_level.as_deref());

    fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}

fn resolve_level(verbose: bool, env_level: Option<&str>) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    env_level.and_then(parse_level_str).unwrap_or(Level::WARN)
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
