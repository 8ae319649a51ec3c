use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::columns::derive_columns;

/// Fixed column ids. The board always carries exactly these four columns;
/// `COLUMN_DONE` is the terminal column.
pub const COLUMN_TODO: &str = "todo";
pub const COLUMN_IN_PROGRESS: &str = "inprogress";
pub const COLUMN_REVIEW: &str = "review";
pub const COLUMN_DONE: &str = "done";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Recurrence rule: a completed task spawns a successor with its due date
/// advanced by one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Advance a due date by one recurrence unit. Monthly advances clamp to
    /// the last day of the target month (Jan 31 -> Feb 28).
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Recurrence::Daily => date + TimeDelta::days(1),
            Recurrence::Weekly => date + TimeDelta::days(7),
            Recurrence::Monthly => date.checked_add_months(Months::new(1)).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub column_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    /// Ids of tasks this task depends on. A task is blocked while any
    /// dependency sits outside the terminal column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub time_spent_seconds: u64,
    /// Set while the work timer is running; `None` otherwise. This is the
    /// only timer-active flag, so "start time present iff active" cannot
    /// be violated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_started_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, column_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            column_id: column_id.into(),
            due_date: None,
            priority: Priority::default(),
            tags: Vec::new(),
            subtasks: Vec::new(),
            dependencies: Vec::new(),
            recurrence: None,
            created_at: now,
            updated_at: now,
            time_spent_seconds: 0,
            timer_started_at: None,
        }
    }

    pub fn timer_active(&self) -> bool {
        self.timer_started_at.is_some()
    }

    /// True while any resolvable dependency is not yet in the done column.
    /// A dependency id that matches no task does not block.
    pub fn is_blocked(&self, all_tasks: &[Task]) -> bool {
        self.dependencies.iter().any(|dep_id| {
            all_tasks
                .iter()
                .any(|t| t.id == *dep_id && t.column_id != COLUMN_DONE)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            task_ids: Vec::new(),
        }
    }
}

/// The fixed four-column template. Stored boards are always reconciled
/// against this, so the defaults survive partial or stale storage.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new(COLUMN_TODO, "To Do"),
        Column::new(COLUMN_IN_PROGRESS, "In Progress"),
        Column::new(COLUMN_REVIEW, "Review"),
        Column::new(COLUMN_DONE, "Done"),
    ]
}

/// The persisted shape: what backends load and save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardData {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// In-memory store state. `error` carries the latest surfaced failure
/// message; the board stays usable regardless.
#[derive(Debug, Clone)]
pub struct BoardState {
    pub tasks: Vec<Task>,
    pub columns: Vec<Column>,
    pub is_loading: bool,
    pub is_initialized: bool,
    pub error: Option<String>,
}

impl BoardState {
    /// Empty board with the default column template, not yet initialized.
    pub fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            columns: default_columns(),
            is_loading: false,
            is_initialized: false,
            error: None,
        }
    }

    /// Empty board in the loading phase of an identity change.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::empty()
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub(crate) fn rederive_columns(&mut self) {
        self.columns = derive_columns(&self.tasks, &self.columns);
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::empty()
    }
}
