//! Saved task history commands

use anyhow::Result;
use clap::Subcommand;

use super::output::{truncate_str, Output};
use crate::storage::{Config, Project, TaskStore};

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Delete every saved task
    Clear,
}

pub fn run(
    output: &Output,
    config: Config,
    cmd: Option<HistoryCommands>,
    limit: Option<usize>,
) -> Result<()> {
    match cmd {
        None => {
            let limit = match limit {
                Some(limit) => limit,
                None => config.with_project()?.project.suggest.history_limit,
            };
            list(output, limit)
        }
        Some(HistoryCommands::Clear) => clear(output),
    }
}

fn list(output: &Output, limit: usize) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.task_store()?;
    let stored = store.recent(limit)?;

    if output.is_json() {
        output.data(&stored);
    } else if stored.is_empty() {
        println!("No saved tasks.");
    } else {
        println!("{:<6} {:<20} {:<10} {:>3}  TITLE", "ID", "SAVED", "DUE", "IMP");
        println!("{}", "-".repeat(70));
        for item in &stored {
            let due = item
                .task
                .due_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<6} {:<20} {:<10} {:>3}  {}",
                item.id,
                item.created_at.format("%Y-%m-%d %H:%M:%S"),
                due,
                item.task.importance,
                truncate_str(&item.task.title, 40)
            );
        }
    }

    Ok(())
}

fn clear(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.task_store()?;
    let removed = store.clear()?;

    output.success(&format!("Removed {} saved task(s)", removed));
    Ok(())
}
