//! Task identifiers
//!
//! Ids are caller-assigned non-negative integers. They are written as plain
//! numbers in JSON and on the command line (e.g. `3`), and an optional `#`
//! prefix is accepted when parsing (e.g. `#3`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid task ID: expected a non-negative integer, got '{0}'")]
    InvalidTaskId(String),
}

/// Identifier of a task, unique within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a task ID from its numeric value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric value of the ID
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the smallest ID not contained in `taken`
    ///
    /// Only the first `taken.len() + 1` candidates need checking, so this is
    /// linear in the number of IDs.
    pub fn smallest_unused<'a>(taken: impl IntoIterator<Item = &'a TaskId>) -> TaskId {
        let taken: Vec<u32> = taken.into_iter().map(|id| id.0).collect();
        let mut seen = vec![false; taken.len() + 1];
        for value in taken {
            if let Some(slot) = seen.get_mut(value as usize) {
                *slot = true;
            }
        }

        let first_free = seen.iter().position(|used| !used).unwrap_or(seen.len());
        TaskId(first_free as u32)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        digits
            .parse::<u32>()
            .map(TaskId)
            .map_err(|_| IdError::InvalidTaskId(s.to_string()))
    }
}

impl From<u32> for TaskId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
