//! Domain models for taskrank
//!
//! Scoring, dependency ordering and validation, without any I/O concerns.

mod task;
mod scoring;
mod graph;
mod suggest;
mod analysis;

pub use task::{parse_date, FieldError, Task, TaskBatch, ValidationError};
pub use scoring::{InvalidSetting, PriorityTier, ScoreBreakdown, Scorer, ScoringConfig, TierThresholds};
pub use graph::{DependencyCycleError, DependencyGraph, TaskRef, UnresolvedReference};
pub use suggest::{Suggester, Suggestion, SuggestionPlan};
pub use analysis::{analyze, sort_by_priority, AnalysisError, ScoredTask};
