//! Dependency-aware suggestions
//!
//! The suggestion order is a topological sort of the batch in which, at every
//! step, the highest-scoring task whose prerequisites are already placed goes
//! next. Done tasks count as placed from the start and are never suggested.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;
use tracing::debug;

use super::graph::{DependencyCycleError, DependencyGraph};
use super::scoring::{PriorityTier, ScoreBreakdown, Scorer};
use super::task::Task;

/// One suggested task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub task: Task,

    /// Position in the submitted batch
    pub index: usize,

    pub score: f64,

    pub tier: PriorityTier,

    #[serde(skip)]
    pub breakdown: ScoreBreakdown,

    /// Titles of open in-batch prerequisites, all of which come earlier
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

/// The ranked suggestions with a human-readable rationale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionPlan {
    pub suggestions: Vec<Suggestion>,
    pub explanation: String,
}

/// Heap entry: higher score first, then lower input index
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

pub struct Suggester<'a> {
    scorer: Scorer<'a>,
}

impl<'a> Suggester<'a> {
    pub fn new(scorer: Scorer<'a>) -> Self {
        Self { scorer }
    }

    /// Orders every open task in the batch
    ///
    /// Returns batch positions. Fails if the dependencies contain a cycle.
    pub fn order(&self, tasks: &[Task]) -> Result<Vec<usize>, DependencyCycleError> {
        let graph = DependencyGraph::from_tasks(tasks);
        graph.check_acyclic(tasks)?;

        let scores: Vec<f64> = tasks.iter().map(|t| self.scorer.score(t)).collect();
        Ok(greedy_order(tasks, &graph, &scores))
    }

    /// Produces the top `limit` suggestions (all open tasks when `None`)
    pub fn suggest(
        &self,
        tasks: &[Task],
        limit: Option<usize>,
    ) -> Result<SuggestionPlan, DependencyCycleError> {
        let graph = DependencyGraph::from_tasks(tasks);
        graph.check_acyclic(tasks)?;

        let breakdowns: Vec<ScoreBreakdown> =
            tasks.iter().map(|t| self.scorer.breakdown(t)).collect();
        let scores: Vec<f64> = breakdowns.iter().map(|b| b.total).collect();

        let mut order = greedy_order(tasks, &graph, &scores);
        if let Some(limit) = limit {
            order.truncate(limit);
        }

        debug!(
            batch = tasks.len(),
            edges = graph.edge_count(),
            suggested = order.len(),
            "computed suggestion order"
        );

        let suggestions: Vec<Suggestion> = order
            .into_iter()
            .map(|index| {
                let after = graph
                    .prerequisites(index)
                    .into_iter()
                    .filter(|&p| !tasks[p].done)
                    .map(|p| tasks[p].title.clone())
                    .collect();

                Suggestion {
                    task: tasks[index].clone(),
                    index,
                    score: scores[index],
                    tier: self.scorer.tier(scores[index]),
                    breakdown: breakdowns[index],
                    after,
                }
            })
            .collect();

        let explanation = self.explain(&suggestions);

        Ok(SuggestionPlan {
            suggestions,
            explanation,
        })
    }

    /// Builds one clause per suggestion, joined with ` | `
    pub fn explain(&self, suggestions: &[Suggestion]) -> String {
        if suggestions.is_empty() {
            return "No open tasks to suggest.".to_string();
        }

        let config = self.scorer.config();

        suggestions
            .iter()
            .map(|s| {
                let task = &s.task;
                let mut parts = vec![format!("'{}'", task.title)];

                if self.scorer.is_overdue(task) {
                    parts.push("is overdue".to_string());
                } else if self.scorer.is_due_soon(task) {
                    if let Some(due) = task.due_date {
                        parts.push(format!("is due soon ({})", due));
                    }
                }
                if task.importance >= config.high_importance {
                    parts.push("has high importance".to_string());
                }
                if task.estimated_hours <= config.quick_win_hours {
                    parts.push("quick to finish (low estimated hours)".to_string());
                }
                for prerequisite in &s.after {
                    parts.push(format!("must follow '{}'", prerequisite));
                }
                if !task.dependencies.is_empty() {
                    parts.push(format!(
                        "has {} dependency(ies) to consider",
                        task.dependencies.len()
                    ));
                }

                parts.join(", ")
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Kahn's algorithm with a max-heap on score
///
/// The graph must be acyclic. Done tasks neither appear in the output nor
/// hold back their dependents.
fn greedy_order(tasks: &[Task], graph: &DependencyGraph, scores: &[f64]) -> Vec<usize> {
    let mut waiting: Vec<usize> = (0..tasks.len())
        .map(|i| {
            graph
                .prerequisites(i)
                .into_iter()
                .filter(|&p| !tasks[p].done)
                .count()
        })
        .collect();

    let mut ready: BinaryHeap<Candidate> = (0..tasks.len())
        .filter(|&i| !tasks[i].done && waiting[i] == 0)
        .map(|index| Candidate {
            score: scores[index],
            index,
        })
        .collect();

    let mut order = Vec::with_capacity(tasks.len());

    while let Some(Candidate { index, .. }) = ready.pop() {
        order.push(index);

        for dependent in graph.dependents(index) {
            if tasks[dependent].done {
                continue;
            }
            waiting[dependent] -= 1;
            if waiting[dependent] == 0 {
                ready.push(Candidate {
                    score: scores[dependent],
                    index: dependent,
                });
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scoring::ScoringConfig;
    use chrono::{Duration, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn titles(plan: &SuggestionPlan) -> Vec<&str> {
        plan.suggestions
            .iter()
            .map(|s| s.task.title.as_str())
            .collect()
    }

    #[test]
    fn prerequisite_comes_first_despite_lower_score() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());
        let suggester = Suggester::new(scorer);

        let tasks = vec![
            Task::new("X").with_importance(1),
            Task::new("Y")
                .with_importance(9)
                .with_due_date(today())
                .depends_on("X"),
        ];
        assert!(scorer.score(&tasks[1]) > scorer.score(&tasks[0]));

        let plan = suggester.suggest(&tasks, None).unwrap();
        assert_eq!(titles(&plan), vec!["X", "Y"]);
        assert_eq!(plan.suggestions[1].after, vec!["X"]);
    }

    #[test]
    fn unrelated_tasks_follow_score() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        let tasks = vec![
            Task::new("low").with_importance(2),
            Task::new("high").with_importance(8),
            Task::new("mid").with_importance(5),
        ];

        let order = suggester.order(&tasks).unwrap();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn ties_keep_input_order() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        let tasks = vec![Task::new("a"), Task::new("b"), Task::new("c")];
        assert_eq!(suggester.order(&tasks).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn unlocked_task_competes_on_score() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        // "base" unlocks "urgent"; "medium" sits between them in score
        let tasks = vec![
            Task::new("base").with_importance(1),
            Task::new("medium").with_importance(5),
            Task::new("urgent")
                .with_importance(10)
                .with_due_date(today() - Duration::days(1))
                .depends_on("base"),
        ];

        let order = suggester.order(&tasks).unwrap();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn cycle_is_reported() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        let tasks = vec![Task::new("A").depends_on("B"), Task::new("B").depends_on("A")];
        let err = suggester.suggest(&tasks, Some(3)).unwrap_err();

        assert_eq!(err.titles(), vec!["A", "B"]);
    }

    #[test]
    fn done_tasks_are_skipped_and_satisfy_dependents() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        let tasks = vec![
            Task::new("setup").completed(),
            Task::new("deploy").depends_on("setup").with_importance(3),
            Task::new("docs").with_importance(2),
        ];

        let plan = suggester.suggest(&tasks, None).unwrap();
        assert_eq!(titles(&plan), vec!["deploy", "docs"]);
        assert!(plan.suggestions[0].after.is_empty());
    }

    #[test]
    fn limit_truncates() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        let tasks: Vec<_> = (1..=6)
            .map(|i| Task::new(format!("t{}", i)).with_importance(i))
            .collect();

        let plan = suggester.suggest(&tasks, Some(3)).unwrap();
        assert_eq!(titles(&plan), vec!["t6", "t5", "t4"]);
    }

    #[test]
    fn explanation_mentions_reasons() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        let tasks = vec![
            Task::new("Pay invoice")
                .with_due_date(today() - Duration::days(2))
                .with_importance(8)
                .with_hours(0.5),
            Task::new("Prepare slides")
                .with_due_date(today() + Duration::days(2))
                .with_hours(3.0)
                .depends_on("Pay invoice"),
        ];

        let plan = suggester.suggest(&tasks, None).unwrap();
        assert_eq!(
            plan.explanation,
            "'Pay invoice', is overdue, has high importance, quick to finish (low estimated hours) \
             | 'Prepare slides', is due soon (2025-06-12), must follow 'Pay invoice', \
             has 1 dependency(ies) to consider"
        );
    }

    #[test]
    fn empty_batch_explains_itself() {
        let config = ScoringConfig::default();
        let suggester = Suggester::new(Scorer::new(&config, today()));

        let plan = suggester.suggest(&[], Some(3)).unwrap();
        assert!(plan.suggestions.is_empty());
        assert_eq!(plan.explanation, "No open tasks to suggest.");
    }
}
