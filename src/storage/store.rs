//! SQLite task store
//!
//! Batches are persisted only when a caller asks for it (`--save` or
//! `"save": true`). The database lives at `.taskrank/tasks.db`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Task;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Stored task {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A persisted task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTask {
    /// Database row id
    pub id: i64,

    pub created_at: DateTime<Utc>,

    #[serde(flatten)]
    pub task: Task,
}

/// Persistence for submitted task batches
pub trait TaskStore {
    /// Persists every task in the batch, returning how many were written
    fn save_batch(&mut self, tasks: &[Task]) -> Result<usize>;

    /// Returns up to `limit` stored tasks, newest first
    fn recent(&self, limit: usize) -> Result<Vec<StoredTask>>;

    /// Deletes every stored task, returning how many were removed
    fn clear(&mut self) -> Result<usize>;
}

pub struct SqliteTaskStore {
    /// None for in-memory databases
    db_path: Option<PathBuf>,

    conn: Connection,
}

impl SqliteTaskStore {
    /// Schema version - bump when schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens (creating if needed) the store at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open task database: {}", db_path.display()))?;

        // WAL for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let mut store = Self {
            db_path: Some(db_path.to_path_buf()),
            conn,
        };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Opens a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self {
            db_path: None,
            conn: Connection::open_in_memory()?,
        };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Returns the path to the database, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn ensure_schema(&mut self) -> Result<()> {
        let current_version = self.schema_version()?;

        if current_version != Self::SCHEMA_VERSION {
            debug!(from = current_version, to = Self::SCHEMA_VERSION, "creating task schema");
            self.create_schema()?;
        }

        Ok(())
    }

    fn schema_version(&self) -> Result<i32> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    fn create_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT,
                title TEXT NOT NULL,
                due_date TEXT,
                importance INTEGER NOT NULL,
                estimated_hours REAL NOT NULL,
                dependencies TEXT NOT NULL,
                done INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
            ",
        )?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    /// Number of stored tasks
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl TaskStore for SqliteTaskStore {
    fn save_batch(&mut self, tasks: &[Task]) -> Result<usize> {
        let created_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO tasks (external_id, title, due_date, importance, estimated_hours, dependencies, done, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for task in tasks {
                let dependencies = serde_json::to_string(&task.dependencies)
                    .context("Failed to serialize dependencies")?;

                stmt.execute(params![
                    task.id,
                    task.title,
                    task.due_date.map(|d| d.to_string()),
                    task.importance,
                    task.estimated_hours,
                    dependencies,
                    task.done,
                    created_at,
                ])?;
            }
        }

        tx.commit()?;
        info!(count = tasks.len(), "saved task batch");

        Ok(tasks.len())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredTask>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, external_id, title, due_date, importance, estimated_hours, dependencies, done, created_at
             FROM tasks ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], RawRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let tasks = rows
            .into_iter()
            .map(RawRow::into_stored)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM tasks", [])?;
        info!(removed, "cleared stored tasks");
        Ok(removed)
    }
}

/// Row columns before decoding
struct RawRow {
    id: i64,
    external_id: Option<String>,
    title: String,
    due_date: Option<String>,
    importance: i64,
    estimated_hours: f64,
    dependencies: String,
    done: bool,
    created_at: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            title: row.get(2)?,
            due_date: row.get(3)?,
            importance: row.get(4)?,
            estimated_hours: row.get(5)?,
            dependencies: row.get(6)?,
            done: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_stored(self) -> Result<StoredTask, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: self.id,
            reason,
        };

        let due_date = self
            .due_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| corrupt(format!("bad due_date: {}", e)))?;

        let dependencies: Vec<String> = serde_json::from_str(&self.dependencies)
            .map_err(|e| corrupt(format!("bad dependencies: {}", e)))?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("bad created_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(StoredTask {
            id: self.id,
            created_at,
            task: Task {
                id: self.external_id,
                title: self.title,
                due_date,
                importance: self.importance,
                estimated_hours: self.estimated_hours,
                dependencies,
                done: self.done,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<Task> {
        vec![
            Task::new("Write report")
                .with_due_date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
                .with_importance(5)
                .with_hours(2.0),
            Task::new("Send report")
                .with_id("send")
                .depends_on("Write report"),
        ]
    }

    #[test]
    fn creates_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".taskrank").join("tasks.db");
        let store = SqliteTaskStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn schema_version_is_set() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), SqliteTaskStore::SCHEMA_VERSION);
    }

    #[test]
    fn save_and_read_back() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let tasks = sample();

        assert_eq!(store.save_batch(&tasks).unwrap(), 2);

        let stored = store.recent(50).unwrap();
        assert_eq!(stored.len(), 2);

        // newest first
        assert_eq!(stored[0].task, tasks[1]);
        assert_eq!(stored[1].task, tasks[0]);
        assert!(stored[0].id > stored[1].id);
    }

    #[test]
    fn recent_respects_limit() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        store.save_batch(&sample()).unwrap();
        store.save_batch(&[Task::new("Third")]).unwrap();

        let stored = store.recent(2).unwrap();
        let titles: Vec<_> = stored.iter().map(|s| s.task.title.as_str()).collect();
        assert_eq!(titles, vec!["Third", "Send report"]);
    }

    #[test]
    fn clear_removes_everything() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        store.save_batch(&sample()).unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.db");

        {
            let mut store = SqliteTaskStore::open(&path).unwrap();
            store.save_batch(&sample()).unwrap();
        }

        let store = SqliteTaskStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn corrupt_row_is_reported() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO tasks (title, importance, estimated_hours, dependencies, created_at)
                 VALUES ('bad', 1, 0, 'not json', '2025-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        let err = store.recent(10).unwrap_err();
        assert!(err.to_string().contains("bad dependencies"), "{}", err);
    }
}
