//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::history::HistoryCommands;
use super::output::{Output, OutputFormat};
use super::{analyze, history, suggest};
use crate::domain::AnalysisError;
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "taskrank")]
#[command(author, version, about = "Score tasks and suggest what to work on next")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskrank project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Score every task in a batch
    ///
    /// Reads `{"tasks": [...], "save": false}` or a bare list from FILE,
    /// or from stdin when FILE is omitted or `-`.
    Analyze {
        /// JSON input file
        file: Option<PathBuf>,

        /// Save the batch to the project database
        #[arg(long)]
        save: bool,

        /// Order by score instead of input order
        #[arg(long)]
        sort: bool,

        /// Reference date for urgency (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Suggest what to work on next
    ///
    /// Without input, suggests from the most recently saved tasks.
    Suggest {
        /// JSON input file
        file: Option<PathBuf>,

        /// Number of suggestions (defaults to suggest.top_k)
        #[arg(long, short = 'n', value_parser = clap::value_parser!(u64).range(1..))]
        top: Option<u64>,

        /// Reference date for urgency (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// List saved tasks, newest first
    History {
        #[command(subcommand)]
        action: Option<HistoryCommands>,

        /// Maximum number of tasks to list (defaults to suggest.history_limit)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },

    /// Show the effective configuration
    Config,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::without_project();
    let format = cli.format.unwrap_or_else(|| {
        config
            .as_ref()
            .map(|c| c.global.default_format)
            .unwrap_or_default()
    });
    let output = Output::new(format);

    let result = config.and_then(|config| {
        debug!(project = ?config.project_root, "taskrank starting");
        dispatch(cli.command, &output, config)
    });

    if let Err(err) = &result {
        output.error_payload(&error_payload(err));
    }

    result
}

/// JSON body for a failed command
fn error_payload(err: &anyhow::Error) -> serde_json::Value {
    match err.downcast_ref::<AnalysisError>() {
        Some(analysis) => analysis.payload(),
        None => serde_json::json!({
            "status": "error",
            "kind": "request",
            "error": format!("{:#}", err),
        }),
    }
}

/// The project's `config.toml` is only read by commands that use it
fn dispatch(command: Commands, output: &Output, config: Config) -> Result<()> {
    match command {
        Commands::Init { path } => {
            debug!(path = %path.display(), "initializing project");
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized taskrank project at {}",
                project.root().display()
            ));
        }

        Commands::Analyze {
            file,
            save,
            sort,
            today,
        } => analyze::run(
            output,
            &config.with_project()?,
            file.as_deref(),
            save,
            sort,
            today.unwrap_or_else(local_today),
        )?,

        Commands::Suggest { file, top, today } => suggest::run(
            output,
            &config.with_project()?,
            file.as_deref(),
            top.map(|n| n as usize),
            today.unwrap_or_else(local_today),
        )?,

        Commands::History { action, limit } => {
            history::run(output, config, action, limit.map(|n| n as usize))?
        }

        Commands::Config => show_config(output, &config.with_project()?)?,
    }

    debug!("command completed successfully");
    Ok(())
}

fn show_config(output: &Output, config: &Config) -> Result<()> {
    if output.is_json() {
        output.data(&serde_json::json!({
            "project_root": config.project_root,
            "scoring": config.project.scoring,
            "suggest": config.project.suggest,
        }));
    } else {
        match &config.project_root {
            Some(root) => println!("# project: {}", root.display()),
            None => println!("# no project found, using defaults"),
        }
        println!("{}", toml::to_string_pretty(&config.project)?);
    }

    Ok(())
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Logs go to stderr; `RUST_LOG` overrides the `--verbose` default
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("taskrank=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
