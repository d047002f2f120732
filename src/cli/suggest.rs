//! The `suggest` command
//!
//! Ranks a batch (or, when none is supplied, the most recently saved tasks)
//! and prints the top suggestions with an explanation.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;

use super::input;
use super::output::{truncate_str, Output};
use crate::domain::{AnalysisError, Scorer, Suggester, SuggestionPlan, Task, TaskBatch};
use crate::storage::{Config, Project, TaskStore};

pub fn run(
    output: &Output,
    config: &Config,
    file: Option<&Path>,
    top: Option<usize>,
    today: NaiveDate,
) -> Result<()> {
    let scoring = &config.project.scoring;

    let batch = match input::read_payload(file)? {
        Some(payload) => {
            TaskBatch::parse(&payload, scoring.importance_range()).map_err(AnalysisError::from)?
        }
        None => TaskBatch::default(),
    };

    if batch.save {
        debug!("ignoring save flag: suggest never persists");
    }

    let tasks = if batch.is_empty() {
        stored_tasks(config.project.suggest.history_limit)?
    } else {
        batch.tasks
    };

    let limit = top.unwrap_or(config.project.suggest.top_k);
    let suggester = Suggester::new(Scorer::new(scoring, today));
    let plan = suggester
        .suggest(&tasks, Some(limit))
        .map_err(AnalysisError::from)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "status": "ok",
            "suggestions": plan.suggestions,
            "explanation": plan.explanation,
        }));
    } else {
        print_plan(output, &plan);
    }

    Ok(())
}

/// Loads saved tasks in the order they were submitted
fn stored_tasks(limit: usize) -> Result<Vec<Task>> {
    let project = Project::open_current()
        .context("No tasks provided and no project to read stored tasks from")?;
    let store = project.task_store()?;

    let mut stored = store.recent(limit)?;
    if stored.is_empty() {
        anyhow::bail!("No tasks provided and no stored tasks available.");
    }
    debug!(count = stored.len(), "suggesting from stored tasks");

    stored.reverse();
    Ok(stored.into_iter().map(|s| s.task).collect())
}

fn print_plan(output: &Output, plan: &SuggestionPlan) {
    if plan.suggestions.is_empty() {
        println!("{}", plan.explanation);
        return;
    }

    println!("Suggested next ({}):", plan.suggestions.len());
    for (rank, suggestion) in plan.suggestions.iter().enumerate() {
        println!(
            "{:>2}. {} {:>8.3}  {}",
            rank + 1,
            output.tier_cell(suggestion.tier, suggestion.tier.label(), 7),
            suggestion.score,
            truncate_str(&suggestion.task.title, 50)
        );
    }

    println!();
    println!("Why: {}", plan.explanation);
}
