//! taskrank - score, rank and suggest tasks
//!
//! Each task gets a priority score from its due date, importance and effort
//! estimate. Suggestions respect declared dependencies: a task is never
//! suggested before its prerequisites, and among the tasks that are free to
//! start the highest score goes first.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Scorer, ScoringConfig, Suggester, Task, TaskBatch};
