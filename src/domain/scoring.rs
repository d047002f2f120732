//! Priority scoring
//!
//! A score is the sum of three bounded terms (urgency, importance, effort),
//! floored at zero. All weights come from [`ScoringConfig`] so that callers
//! can swap weight profiles without touching global state.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::task::Task;

#[derive(Debug, Error, PartialEq)]
#[error("Invalid scoring setting '{field}': {reason}")]
pub struct InvalidSetting {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidSetting {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Presentation band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl PriorityTier {
    pub fn label(&self) -> &'static str {
        match self {
            PriorityTier::Low => "low",
            PriorityTier::Medium => "medium",
            PriorityTier::High => "high",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower score bounds for the medium and high tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium: 20.0,
            high: 40.0,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, score: f64) -> PriorityTier {
        if score >= self.high {
            PriorityTier::High
        } else if score >= self.medium {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

/// Weights and thresholds used by the [`Scorer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points per importance unit
    pub importance_weight: f64,

    /// Lowest importance accepted by validation
    pub importance_min: i64,

    /// Highest importance accepted by validation
    pub importance_max: i64,

    /// Importance at or above which a task is called out as highly important
    pub high_importance: i64,

    /// Flat urgency for any task past its due date
    pub overdue_bonus: f64,

    /// Flat urgency for tasks due within `due_soon_days`
    pub due_soon_bonus: f64,

    pub due_soon_days: i64,

    /// Extra points per day closer than `due_soon_days`
    pub approach_step: f64,

    /// Urgency for tasks without a due date
    pub no_due_date_urgency: f64,

    /// Tasks at or below this many hours count as quick wins
    pub quick_win_hours: f64,

    pub quick_win_bonus: f64,

    /// Penalty per estimated hour for tasks that are not quick wins
    pub effort_penalty_per_hour: f64,

    /// Cap on the effort penalty
    pub max_effort_penalty: f64,

    pub tiers: TierThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            importance_weight: 3.0,
            importance_min: 1,
            importance_max: 10,
            high_importance: 7,
            overdue_bonus: 50.0,
            due_soon_bonus: 20.0,
            due_soon_days: 3,
            approach_step: 2.0,
            no_due_date_urgency: 0.0,
            quick_win_hours: 1.0,
            quick_win_bonus: 5.0,
            effort_penalty_per_hour: 0.5,
            max_effort_penalty: 10.0,
            tiers: TierThresholds::default(),
        }
    }
}

impl ScoringConfig {
    /// The importance values accepted at the validation boundary
    pub fn importance_range(&self) -> RangeInclusive<i64> {
        self.importance_min..=self.importance_max
    }

    /// Checks the settings keep the score monotone and the tiers ordered
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        let non_negative = [
            ("importance_weight", self.importance_weight),
            ("overdue_bonus", self.overdue_bonus),
            ("due_soon_bonus", self.due_soon_bonus),
            ("approach_step", self.approach_step),
            ("no_due_date_urgency", self.no_due_date_urgency),
            ("quick_win_hours", self.quick_win_hours),
            ("quick_win_bonus", self.quick_win_bonus),
            ("effort_penalty_per_hour", self.effort_penalty_per_hour),
            ("max_effort_penalty", self.max_effort_penalty),
            ("tiers.medium", self.tiers.medium),
            ("tiers.high", self.tiers.high),
        ];

        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(InvalidSetting::new(
                    field,
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }

        if self.due_soon_days < 0 {
            return Err(InvalidSetting::new(
                "due_soon_days",
                format!("must not be negative, got {}", self.due_soon_days),
            ));
        }

        if self.importance_min > self.importance_max {
            return Err(InvalidSetting::new(
                "importance_min",
                format!(
                    "{} is greater than importance_max {}",
                    self.importance_min, self.importance_max
                ),
            ));
        }

        if self.tiers.medium > self.tiers.high {
            return Err(InvalidSetting::new(
                "tiers.medium",
                format!(
                    "{} is greater than tiers.high {}",
                    self.tiers.medium, self.tiers.high
                ),
            ));
        }

        Ok(())
    }
}

/// The terms that make up a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub urgency: f64,
    pub importance: f64,
    pub effort: f64,
    pub total: f64,
}

/// Scores tasks against a fixed reference date
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    config: &'a ScoringConfig,
    today: NaiveDate,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a ScoringConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    pub fn config(&self) -> &'a ScoringConfig {
        self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Days from the reference date until `due` (negative when overdue)
    pub fn days_until(&self, due: NaiveDate) -> i64 {
        (due - self.today).num_days()
    }

    /// Urgency contribution of a due date
    pub fn urgency(&self, due_date: Option<NaiveDate>) -> f64 {
        let Some(due) = due_date else {
            return self.config.no_due_date_urgency;
        };

        let days = self.days_until(due);
        if days < 0 {
            self.config.overdue_bonus
        } else if days <= self.config.due_soon_days {
            let closeness = (self.config.due_soon_days - days) as f64;
            self.config.due_soon_bonus + closeness * self.config.approach_step
        } else {
            0.0
        }
    }

    /// Importance contribution
    pub fn importance(&self, importance: i64) -> f64 {
        importance as f64 * self.config.importance_weight
    }

    /// Effort contribution: a bonus for quick wins, a capped penalty otherwise
    pub fn effort(&self, hours: f64) -> f64 {
        if hours <= self.config.quick_win_hours {
            self.config.quick_win_bonus
        } else {
            -(hours * self.config.effort_penalty_per_hour).min(self.config.max_effort_penalty)
        }
    }

    pub fn breakdown(&self, task: &Task) -> ScoreBreakdown {
        let urgency = self.urgency(task.due_date);
        let importance = self.importance(task.importance);
        let effort = self.effort(task.estimated_hours);

        let total = if task.done {
            0.0
        } else {
            round3((urgency + importance + effort).max(0.0))
        };

        ScoreBreakdown {
            urgency,
            importance,
            effort,
            total,
        }
    }

    pub fn score(&self, task: &Task) -> f64 {
        self.breakdown(task).total
    }

    pub fn tier(&self, score: f64) -> PriorityTier {
        self.config.tiers.classify(score)
    }

    /// True if `task` is past due relative to the reference date
    pub fn is_overdue(&self, task: &Task) -> bool {
        task.due_date.is_some_and(|due| self.days_until(due) < 0)
    }

    /// True if `task` is due within the due-soon window
    pub fn is_due_soon(&self, task: &Task) -> bool {
        task.due_date.is_some_and(|due| {
            let days = self.days_until(due);
            (0..=self.config.due_soon_days).contains(&days)
        })
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn report_outranks_desk() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());

        let report = Task::new("Write report")
            .with_due_date(today())
            .with_importance(5)
            .with_hours(2.0);
        let desk = Task::new("Clean desk").with_importance(1).with_hours(1.0);

        assert!(scorer.score(&report) > scorer.score(&desk));
    }

    #[test]
    fn default_breakdown() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());

        // due today: 20 + 3 * 2 urgency, 5 * 3 importance, -1 effort
        let task = Task::new("x")
            .with_due_date(today())
            .with_importance(5)
            .with_hours(2.0);
        let b = scorer.breakdown(&task);

        assert_eq!(b.urgency, 26.0);
        assert_eq!(b.importance, 15.0);
        assert_eq!(b.effort, -1.0);
        assert_eq!(b.total, 40.0);
        assert_eq!(scorer.tier(b.total), PriorityTier::High);
    }

    #[test]
    fn urgency_bands() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());

        let overdue = scorer.urgency(Some(today() - Duration::days(4)));
        let due_today = scorer.urgency(Some(today()));
        let due_in_three = scorer.urgency(Some(today() + Duration::days(3)));
        let far = scorer.urgency(Some(today() + Duration::days(30)));
        let none = scorer.urgency(None);

        assert_eq!(overdue, 50.0);
        assert_eq!(due_today, 26.0);
        assert_eq!(due_in_three, 20.0);
        assert_eq!(far, 0.0);
        assert_eq!(none, config.no_due_date_urgency);
        assert!(overdue > due_today && due_today > due_in_three && due_in_three > far);
    }

    #[test]
    fn effort_penalty_is_capped() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());

        assert_eq!(scorer.effort(0.0), 5.0);
        assert_eq!(scorer.effort(1.0), 5.0);
        assert_eq!(scorer.effort(4.0), -2.0);
        assert_eq!(scorer.effort(20.0), -10.0);
        assert_eq!(scorer.effort(500.0), -10.0);
    }

    #[test]
    fn score_never_negative() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());

        let task = Task::new("huge").with_importance(1).with_hours(100.0);
        assert_eq!(scorer.score(&task), 0.0);
        assert_eq!(scorer.tier(0.0), PriorityTier::Low);
    }

    #[test]
    fn done_tasks_score_zero() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());

        let task = Task::new("finished")
            .with_due_date(today())
            .with_importance(10)
            .completed();
        assert_eq!(scorer.score(&task), 0.0);
    }

    #[test]
    fn custom_weights() {
        let config = ScoringConfig {
            importance_weight: 10.0,
            quick_win_bonus: 0.0,
            ..ScoringConfig::default()
        };
        let scorer = Scorer::new(&config, today());

        let task = Task::new("x").with_importance(4);
        assert_eq!(scorer.score(&task), 40.0);
    }

    #[test]
    fn due_flags() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config, today());

        let overdue = Task::new("a").with_due_date(today() - Duration::days(1));
        let soon = Task::new("b").with_due_date(today() + Duration::days(2));
        let later = Task::new("c").with_due_date(today() + Duration::days(9));

        assert!(scorer.is_overdue(&overdue));
        assert!(!scorer.is_due_soon(&overdue));
        assert!(scorer.is_due_soon(&soon));
        assert!(!scorer.is_due_soon(&later));
        assert!(!scorer.is_overdue(&Task::new("d")));
    }

    #[test]
    fn tier_boundaries() {
        let tiers = TierThresholds::default();
        assert_eq!(tiers.classify(19.999), PriorityTier::Low);
        assert_eq!(tiers.classify(20.0), PriorityTier::Medium);
        assert_eq!(tiers.classify(40.0), PriorityTier::High);
    }

    #[test]
    fn validate_rejects_bad_settings() {
        assert!(ScoringConfig::default().validate().is_ok());

        let negative = ScoringConfig {
            effort_penalty_per_hour: -1.0,
            ..ScoringConfig::default()
        };
        assert_eq!(negative.validate().unwrap_err().field, "effort_penalty_per_hour");

        let inverted = ScoringConfig {
            tiers: TierThresholds {
                medium: 50.0,
                high: 10.0,
            },
            ..ScoringConfig::default()
        };
        assert_eq!(inverted.validate().unwrap_err().field, "tiers.medium");

        let range = ScoringConfig {
            importance_min: 5,
            importance_max: 1,
            ..ScoringConfig::default()
        };
        assert_eq!(range.validate().unwrap_err().field, "importance_min");
    }
}
