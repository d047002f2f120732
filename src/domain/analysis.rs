//! Batch analysis and the combined error type
//!
//! [`analyze`] annotates every task with its score and tier, keeping input
//! order. [`AnalysisError`] carries the structured failure reported back to
//! callers.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::graph::DependencyCycleError;
use super::scoring::{PriorityTier, Scorer};
use super::task::{Task, ValidationError};

/// A task annotated with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTask {
    #[serde(flatten)]
    pub task: Task,
    pub score: f64,
    pub tier: PriorityTier,
}

/// Scores every task, in input order
pub fn analyze(tasks: &[Task], scorer: &Scorer<'_>) -> Vec<ScoredTask> {
    tasks
        .iter()
        .map(|task| {
            let score = scorer.score(task);
            ScoredTask {
                task: task.clone(),
                score,
                tier: scorer.tier(score),
            }
        })
        .collect()
}

/// Sorts by score descending, then importance descending, then earliest due date
///
/// Tasks without a due date sort after dated ones. The sort is stable.
pub fn sort_by_priority(scored: &mut [ScoredTask]) {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.task.importance.cmp(&a.task.importance))
            .then_with(|| match (a.task.due_date, b.task.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
}

/// Why a batch was rejected
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cycle(#[from] DependencyCycleError),
}

impl AnalysisError {
    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Validation(_) => "validation",
            AnalysisError::Cycle(_) => "dependency_cycle",
        }
    }

    /// The error body returned to callers
    pub fn payload(&self) -> Value {
        let mut body = json!({
            "status": "error",
            "kind": self.kind(),
            "error": self.to_string(),
        });

        match self {
            AnalysisError::Validation(ValidationError::Fields(errors)) => {
                body["details"] = json!(errors);
            }
            AnalysisError::Validation(ValidationError::Payload(_)) => {}
            AnalysisError::Cycle(cycle) => {
                body["cycles"] = json!(cycle.cycles);
            }
        }

        body
    }
}
