//! taskgraph - Local-first task dependency tracking

use std::process::ExitCode;

fn main() -> ExitCode {
    taskgraph::cli::run()
}
