//! Project management
//!
//! Handles project initialization and provides access to the task store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::PROJECT_DIR;
use super::{Config, SqliteTaskStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskrank project. Run 'taskrank init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# taskrank configuration
#
# Every key is optional; missing keys use the defaults shown here.

[scoring]
# importance_weight = 3.0
# importance_min = 1
# importance_max = 10
# high_importance = 7
# overdue_bonus = 50.0
# due_soon_bonus = 20.0
# due_soon_days = 3
# approach_step = 2.0
# no_due_date_urgency = 0.0
# quick_win_hours = 1.0
# quick_win_bonus = 5.0
# effort_penalty_per_hour = 0.5
# max_effort_penalty = 10.0

[scoring.tiers]
# medium = 20.0
# high = 40.0

[suggest]
# top_k = 3
# history_limit = 50
"#;

const GITIGNORE: &str = r#"# Saved batches are local
tasks.db
tasks.db-wal
tasks.db-shm
"#;

/// A taskrank project
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        Ok(Self { root })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left untouched, so running this twice is harmless.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(PROJECT_DIR);

        fs::create_dir_all(&project_dir).with_context(|| {
            format!("Failed to create {} directory: {}", PROJECT_DIR, project_dir.display())
        })?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = project_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `.taskrank` directory path
    pub fn dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Loads the configuration for this project
    pub fn config(&self) -> Result<Config> {
        Config::for_project(&self.root)
    }

    /// Returns the path of the task database
    pub fn db_path(&self) -> PathBuf {
        self.dir().join("tasks.db")
    }

    /// Opens the task store for this project
    pub fn task_store(&self) -> Result<SqliteTaskStore> {
        SqliteTaskStore::open(&self.db_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;
    use crate::storage::TaskStore;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.dir().is_dir());
        assert!(project.dir().join("config.toml").is_file());
        assert!(project.dir().join(".gitignore").is_file());
    }

    #[test]
    fn default_config_file_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert_eq!(
            project.config().unwrap().project,
            crate::storage::ProjectConfig::default()
        );
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        fs::write(
            dir.path().join(PROJECT_DIR).join("config.toml"),
            "[suggest]\ntop_k = 7\n",
        )
        .unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert_eq!(project.config().unwrap().project.suggest.top_k, 7);
    }

    #[test]
    fn broken_config_does_not_block_open() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        fs::write(dir.path().join(PROJECT_DIR).join("config.toml"), "[scoring\n").unwrap();

        let project = Project::init(dir.path()).unwrap();
        assert!(project.task_store().is_ok());
        assert!(project.config().is_err());
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        let result = Project::open(dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn task_store_is_accessible() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let mut store = project.task_store().unwrap();
        store.save_batch(&[Task::new("persisted")]).unwrap();

        assert!(project.db_path().is_file());
        assert_eq!(project.task_store().unwrap().count().unwrap(), 1);
    }
}
