//! Configuration handling for taskrank
//!
//! Configuration is stored in `.taskrank/config.toml` (project) and
//! `~/.config/taskrank/config.toml` (global). Scoring weights live in the
//! project file so that a team shares one weight profile.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ScoringConfig;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".taskrank";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Settings for the `suggest` command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SuggestConfig {
    /// Number of suggestions to return
    pub top_k: usize,

    /// Stored tasks considered when no batch is supplied
    pub history_limit: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            history_limit: 50,
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub scoring: ScoringConfig,
    pub suggest: SuggestConfig,
}

impl ProjectConfig {
    /// Rejects settings that would break scoring or suggestion
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.suggest.top_k == 0 {
            return Err(ConfigError::Invalid(
                "suggest.top_k must be at least 1".to_string(),
            ));
        }
        if self.suggest.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "suggest.history_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads the global config and locates the project, leaving the
    /// project's `config.toml` unread
    pub fn without_project() -> Result<Self> {
        Ok(Self {
            project: ProjectConfig::default(),
            global: Self::load_global()?,
            project_root: Self::find_project_root(),
        })
    }

    /// Reads the project's `config.toml`, if a project was found
    pub fn with_project(mut self) -> Result<Self> {
        if let Some(root) = &self.project_root {
            self.project = Self::load_project_config(root)?;
        }
        Ok(self)
    }

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
        ProjectDirs::from("dev", "taskrank", "taskrank").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
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

    /// Loads and validates project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config = parse_project_config(&content)
            .with_context(|| format!("Bad project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for a `.taskrank/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Walks up from `start` looking for a `.taskrank/` directory
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if we're in a taskrank project
    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Returns the project root, or an error if not in a project
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a taskrank project. Run 'taskrank init' first."))
    }
}

/// Parses and validates the contents of a project `config.toml`
pub fn parse_project_config(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert_eq!(config.project.suggest.top_k, 3);
        assert_eq!(config.project.suggest.history_limit, 50);
        assert_eq!(config.project.scoring, ScoringConfig::default());
        assert_eq!(config.global.default_format, OutputFormat::Text);
        assert!(config.project.validate().is_ok());
    }

    #[test]
    fn parse_partial_project_config() {
        let toml = r#"
[scoring]
importance_weight = 4.5
importance_max = 5

[scoring.tiers]
high = 60.0

[suggest]
top_k = 5
"#;

        let config = parse_project_config(toml).unwrap();
        assert_eq!(config.scoring.importance_weight, 4.5);
        assert_eq!(config.scoring.importance_max, 5);
        assert_eq!(config.scoring.tiers.high, 60.0);
        assert_eq!(config.scoring.tiers.medium, 20.0);
        assert_eq!(config.scoring.overdue_bonus, 50.0);
        assert_eq!(config.suggest.top_k, 5);
        assert_eq!(config.suggest.history_limit, 50);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_project_config("[scoring]\noverdue_bonus = -5.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = parse_project_config("[suggest]\ntop_k = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = parse_project_config("[scoring\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"
default_format = "json"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = ProjectConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(parse_project_config(&text).unwrap(), config);
    }

    #[test]
    fn find_project_root_walks_up() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();

        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn project_config_is_read_on_demand() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();
        fs::write(dir.path().join(PROJECT_DIR).join("config.toml"), "[scoring\n").unwrap();

        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: Some(dir.path().to_path_buf()),
        };
        assert!(config.is_in_project());
        assert!(config.with_project().is_err());

        fs::write(dir.path().join(PROJECT_DIR).join("config.toml"), "[suggest]\ntop_k = 9\n").unwrap();
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: Some(dir.path().to_path_buf()),
        }
        .with_project()
        .unwrap();
        assert_eq!(config.project.suggest.top_k, 9);
    }

    #[test]
    fn config_not_in_project() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert!(!config.is_in_project());
        assert!(config.require_project_root().is_err());
    }
}
