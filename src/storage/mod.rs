//! # Storage Layer
//!
//! Project discovery, configuration and optional persistence of task batches.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Saved batches | SQLite | `.taskrank/tasks.db` |
//! | Project config | TOML | `.taskrank/config.toml` |
//! | Global config | TOML | platform config dir, `config.toml` |
//!
//! ## Project Structure
//!
//! ```text
//! .taskrank/
//! ├── config.toml           # Scoring weights and suggestion settings
//! ├── tasks.db              # Saved batches (created on first save)
//! └── .gitignore            # Ignores the database
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a taskrank project
//! - [`TaskStore`] - Persistence interface, called only when saving is requested
//! - [`SqliteTaskStore`] - SQLite implementation of [`TaskStore`]
//! - [`Config`] - Project and global configuration

mod config;
mod project;
mod store;

pub use config::{
    parse_project_config, Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig,
    SuggestConfig, PROJECT_DIR,
};
pub use project::{Project, ProjectError};
pub use store::{SqliteTaskStore, StoreError, StoredTask, TaskStore};
