//! The `analyze` command
//!
//! Scores every task in a batch and optionally saves the batch.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info};

use super::input;
use super::output::{truncate_str, Output};
use crate::domain::{analyze, sort_by_priority, AnalysisError, ScoredTask, Scorer, TaskBatch};
use crate::storage::{Config, Project, TaskStore};

pub fn run(
    output: &Output,
    config: &Config,
    file: Option<&Path>,
    save: bool,
    sort: bool,
    today: NaiveDate,
) -> Result<()> {
    let payload = input::read_payload(file)?
        .context("No tasks supplied. Pass a JSON file or pipe JSON on stdin.")?;

    let scoring = &config.project.scoring;
    let batch = TaskBatch::parse(&payload, scoring.importance_range()).map_err(AnalysisError::from)?;
    debug!(tasks = batch.tasks.len(), %today, "validated batch");

    let scorer = Scorer::new(scoring, today);
    let mut scored = analyze(&batch.tasks, &scorer);
    if sort {
        sort_by_priority(&mut scored);
    }

    let saved = if save || batch.save {
        let project = Project::open_current().context("Cannot save tasks")?;
        let mut store = project.task_store()?;
        let count = store.save_batch(&batch.tasks)?;
        info!(count, db = %project.db_path().display(), "batch saved");
        Some(count)
    } else {
        None
    };

    if output.is_json() {
        let mut body = serde_json::json!({
            "status": "ok",
            "tasks": scored,
        });
        if let Some(count) = saved {
            body["saved"] = serde_json::json!(count);
        }
        output.data(&body);
    } else {
        print_table(output, &scored);
        if let Some(count) = saved {
            println!();
            println!("Saved {} task(s)", count);
        }
    }

    Ok(())
}

fn print_table(output: &Output, scored: &[ScoredTask]) {
    if scored.is_empty() {
        println!("No tasks to analyze.");
        return;
    }

    println!(
        "{:>8}  {:<7} {:<10}  {:>3}  {:>6}  TITLE",
        "SCORE", "TIER", "DUE", "IMP", "HOURS"
    );
    println!("{}", "-".repeat(72));

    for item in scored {
        let task = &item.task;
        let due = task
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let title = if task.done {
            format!("{} (done)", task.title)
        } else {
            task.title.clone()
        };

        println!(
            "{:>8.3}  {} {:<10}  {:>3}  {:>6.1}  {}",
            item.score,
            output.tier_cell(item.tier, item.tier.label(), 7),
            due,
            task.importance,
            task.estimated_hours,
            truncate_str(&title, 40)
        );
    }
}
