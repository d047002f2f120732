//! Task records and the validation boundary
//!
//! Payloads arrive as loosely typed JSON. They are validated once here and
//! turned into fixed-shape [`Task`] values; scoring and ordering never
//! re-check fields.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A single validation failure, tied to the offending task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Zero-based position of the task in the submitted batch
    pub index: usize,
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            index,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {} ({}): {}", self.index, self.field, self.message)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("Validation failed for {} field(s): {}", .0.len(), join_errors(.0))]
    Fields(Vec<FieldError>),
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Caller-supplied identifier, usable as a dependency reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub title: String,

    pub due_date: Option<NaiveDate>,

    pub importance: i64,

    pub estimated_hours: f64,

    /// References (ids or titles) to prerequisite tasks in the same batch
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// Creates an open task with importance 1, no deadline and no effort estimate
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            due_date: None,
            importance: 1,
            estimated_hours: 0.0,
            dependencies: Vec::new(),
            done: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_importance(mut self, importance: i64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = hours;
        self
    }

    pub fn depends_on(mut self, reference: impl Into<String>) -> Self {
        self.dependencies.push(reference.into());
        self
    }

    pub fn completed(mut self) -> Self {
        self.done = true;
        self
    }

    /// Returns true if `reference` names this task by id
    pub fn has_id(&self, reference: &str) -> bool {
        self.id.as_deref() == Some(reference.trim())
    }

    /// Returns true if `reference` names this task by title
    ///
    /// Titles compare case-insensitively, ignoring surrounding whitespace.
    pub fn has_title(&self, reference: &str) -> bool {
        self.title.trim().to_lowercase() == reference.trim().to_lowercase()
    }
}

/// A validated batch of tasks plus the persistence flag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskBatch {
    pub tasks: Vec<Task>,
    pub save: bool,
}

impl TaskBatch {
    /// Validates a JSON payload
    ///
    /// Accepts either `{"tasks": [...], "save": bool}` or a bare array of
    /// task objects. Every field error across the batch is collected; if any
    /// exist the whole batch is rejected.
    pub fn parse(payload: &Value, importance: RangeInclusive<i64>) -> Result<Self, ValidationError> {
        let (items, save) = match payload {
            Value::Array(items) => (items, false),
            Value::Object(map) => {
                let save = match map.get("save") {
                    None | Some(Value::Null) => false,
                    Some(Value::Bool(save)) => *save,
                    Some(other) => {
                        return Err(ValidationError::Payload(format!(
                            "'save' must be a boolean, got {}",
                            kind_of(other)
                        )))
                    }
                };

                match map.get("tasks") {
                    Some(Value::Array(items)) => (items, save),
                    None | Some(Value::Null) => {
                        return Err(ValidationError::Payload(
                            "missing 'tasks' in request body".to_string(),
                        ))
                    }
                    Some(other) => {
                        return Err(ValidationError::Payload(format!(
                            "'tasks' must be a list, got {}",
                            kind_of(other)
                        )))
                    }
                }
            }
            other => {
                return Err(ValidationError::Payload(format!(
                    "expected an object or a list, got {}",
                    kind_of(other)
                )))
            }
        };

        let mut errors = Vec::new();
        let mut tasks = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            match item {
                Value::Object(fields) => {
                    if let Some(task) = parse_task(index, fields, &importance, &mut errors) {
                        tasks.push(task);
                    }
                }
                _ => errors.push(FieldError::new(index, "task", "is not an object")),
            }
        }

        if errors.is_empty() {
            Ok(Self { tasks, save })
        } else {
            Err(ValidationError::Fields(errors))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Parses one task object, pushing every problem found into `errors`
fn parse_task(
    index: usize,
    fields: &Map<String, Value>,
    importance_range: &RangeInclusive<i64>,
    errors: &mut Vec<FieldError>,
) -> Option<Task> {
    let before = errors.len();

    let title = match fields.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        None | Some(Value::Null) | Some(Value::String(_)) => format!("Untitled {}", index + 1),
        Some(other) => {
            errors.push(FieldError::new(
                index,
                "title",
                format!("must be a string, got {}", kind_of(other)),
            ));
            String::new()
        }
    };

    let id = match fields.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            errors.push(FieldError::new(
                index,
                "id",
                format!("must be a non-empty string or number, got {}", kind_of(other)),
            ));
            None
        }
    };

    let due_date = match fields.get("due_date") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => match parse_date(s) {
            Some(date) => Some(date),
            None => {
                errors.push(FieldError::new(
                    index,
                    "due_date",
                    format!("invalid date '{}', expected YYYY-MM-DD", s),
                ));
                None
            }
        },
        Some(other) => {
            errors.push(FieldError::new(
                index,
                "due_date",
                format!("must be a date string, got {}", kind_of(other)),
            ));
            None
        }
    };

    let importance = match fields.get("importance") {
        None | Some(Value::Null) => 1,
        Some(value) => match as_integer(value) {
            Some(n) if importance_range.contains(&n) => n,
            Some(n) => {
                errors.push(FieldError::new(
                    index,
                    "importance",
                    format!(
                        "{} is outside the allowed range {}..={}",
                        n,
                        importance_range.start(),
                        importance_range.end()
                    ),
                ));
                0
            }
            None => {
                errors.push(FieldError::new(
                    index,
                    "importance",
                    format!("must be an integer, got {}", value),
                ));
                0
            }
        },
    };

    let hours_value = fields
        .get("estimated_hours")
        .or_else(|| fields.get("estimated_effort"));
    let estimated_hours = match hours_value {
        None | Some(Value::Null) => 0.0,
        Some(value) => match as_number(value) {
            Some(h) if h.is_finite() && h >= 0.0 => h,
            Some(h) => {
                errors.push(FieldError::new(
                    index,
                    "estimated_hours",
                    format!("must be a non-negative number, got {}", h),
                ));
                0.0
            }
            None => {
                errors.push(FieldError::new(
                    index,
                    "estimated_hours",
                    format!("must be a number, got {}", value),
                ));
                0.0
            }
        },
    };

    let dependencies = match fields.get("dependencies") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::String(s)) => vec![s.trim().to_string()],
        Some(Value::Array(items)) => {
            let mut refs = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => refs.push(s.trim().to_string()),
                    Value::Number(n) => refs.push(n.to_string()),
                    other => errors.push(FieldError::new(
                        index,
                        "dependencies",
                        format!("entries must be non-empty strings or numbers, got {}", kind_of(other)),
                    )),
                }
            }
            refs
        }
        Some(other) => {
            errors.push(FieldError::new(
                index,
                "dependencies",
                format!("must be a list, got {}", kind_of(other)),
            ));
            Vec::new()
        }
    };

    let done = match fields.get("done") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(done)) => *done,
        Some(other) => {
            errors.push(FieldError::new(
                index,
                "done",
                format!("must be a boolean, got {}", kind_of(other)),
            ));
            false
        }
    };

    if errors.len() > before {
        return None;
    }

    Some(Task {
        id,
        title,
        due_date,
        importance,
        estimated_hours,
        dependencies,
        done,
    })
}

/// Parses `YYYY-MM-DD`, or an ISO-8601 timestamp truncated to its date
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_whole_i64(*f)).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whole floats inside the `i64` range; `as` would saturate anything beyond
fn is_whole_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
