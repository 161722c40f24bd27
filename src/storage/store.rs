//! JSON storage for tasks
//!
//! Tasks are stored in `.taskgraph/tasks.json` as a single JSON array of
//! records in their minimal form, so diffs stay small. Uses file locking for
//! concurrent access safety.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

use crate::domain::{JsonStyle, RawTask, TaskManager};

/// Store for task records in a JSON file
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(super::project::data_dir(project_root).join("tasks.json"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored text, or `None` if there is no file yet
    fn read_text(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on task store")?;

        let mut text = String::new();
        file.read_to_string(&mut text)
            .with_context(|| format!("Failed to read task store: {}", self.path.display()))?;

        Ok(Some(text))
    }

    /// Reads all records without building a graph
    pub fn read_records(&self) -> Result<Vec<RawTask>> {
        match self.read_text()? {
            Some(text) if !text.trim().is_empty() => serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse task store: {}", self.path.display())),
            _ => Ok(Vec::new()),
        }
    }

    /// Loads the stored tasks and builds their graph
    pub fn load(&self) -> Result<TaskManager> {
        let records = self.read_records()?;
        debug!(path = %self.path.display(), records = records.len(), "loaded task store");

        TaskManager::new(records)
            .with_context(|| format!("Invalid task graph in {}", self.path.display()))
    }

    /// Writes every record of `manager` to the store (full rewrite)
    pub fn save(&self, manager: &TaskManager, pretty: bool) -> Result<()> {
        let style = if pretty { JsonStyle::Pretty } else { JsonStyle::Compact };
        let json = manager.to_json(style).context("Failed to serialize tasks")?;
        self.write_text(&json)?;

        debug!(path = %self.path.display(), records = manager.records().len(), "saved task store");
        Ok(())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write to temp file first
        let temp_path = self.path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on task store")?;

            let mut writer = BufWriter::new(&file);
            writeln!(writer, "{}", text).context("Failed to write tasks")?;
            writer.flush().context("Failed to flush task store")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Progress, TaskId};
    use tempfile::TempDir;

    fn make_manager() -> TaskManager {
        TaskManager::new(vec![
            RawTask::new(TaskId::new(0), "cook lunch").with_dependencies([TaskId::new(1)]),
            RawTask::new(TaskId::new(1), "buy food").with_priority(2),
        ])
        .unwrap()
    }

    #[test]
    fn read_missing_store() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));

        assert!(store.read_records().unwrap().is_empty());
        assert!(store.load().unwrap().graph().is_empty());
    }

    #[test]
    fn empty_file_reads_as_no_tasks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "\n").unwrap();

        assert!(TaskStore::new(path).read_records().unwrap().is_empty());
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));

        store.save(&make_manager(), true).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.records(), make_manager().records());
        assert_eq!(
            loaded.graph().get(TaskId::new(0)).unwrap().progress,
            Progress::Blocked
        );
    }

    #[test]
    fn compact_output_is_one_line() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));

        store.save(&make_manager(), false).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains(r#"{"id":1,"name":"buy food","priority":2}"#));
    }

    #[test]
    fn invalid_graph_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, r#"[{"id": 0, "name": "a", "dependencies": [7]}]"#).unwrap();

        let err = TaskStore::new(path).load().unwrap_err();
        assert!(format!("{:#}", err).contains("Reference to non-existent task (0 --> 7)"));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, r#"{"id": 0}"#).unwrap();

        assert!(TaskStore::new(path).read_records().is_err());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("nested").join("dir").join("tasks.json"));

        store.save(&make_manager(), true).unwrap();

        assert!(store.path().exists());
    }

    #[test]
    fn atomic_write() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));

        store.save(&make_manager(), true).unwrap();

        // Temp file should not exist after write
        let temp_path = store.path().with_extension("json.tmp");
        assert!(!temp_path.exists());
    }
}
