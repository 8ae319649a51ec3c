/// Ephemeral filter and sort views over the task list.
///
/// Pure reads for the UI layer: nothing here mutates tasks or columns, and
/// none of this state is persisted remotely.
use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::types::{Priority, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueFilter {
    #[default]
    Any,
    Overdue,
    Today,
    Week,
    Future,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring over title and description.
    pub text: Option<String>,
    /// Empty means any priority.
    pub priorities: Vec<Priority>,
    /// Task must carry every listed tag.
    pub tags: Vec<String>,
    pub due: DueFilter,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.priorities.is_empty()
            && self.tags.is_empty()
            && self.due == DueFilter::Any
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }

        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }

        if !self.tags.iter().all(|tag| task.tags.contains(tag)) {
            return false;
        }

        match self.due {
            DueFilter::Any => true,
            DueFilter::Overdue => task.due_date.is_some_and(|d| d < today),
            DueFilter::Today => task.due_date == Some(today),
            DueFilter::Week => task.due_date.is_some_and(|d| {
                let week_start =
                    today - TimeDelta::days(today.weekday().num_days_from_monday() as i64);
                let week_end = week_start + TimeDelta::days(6);
                d >= week_start && d <= week_end
            }),
            DueFilter::Future => task.due_date.is_some_and(|d| d > today),
        }
    }
}

/// Apply a filter, preserving task order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter, today: NaiveDate) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t, today)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    /// Tasks without a due date sort last.
    DueDate,
    /// High first.
    Priority,
    Title,
}

pub fn sort_tasks(tasks: &mut [&Task], key: SortKey) {
    match key {
        SortKey::CreatedAt => tasks.sort_by_key(|t| t.created_at),
        SortKey::DueDate => tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date)),
        SortKey::Priority => tasks.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortKey::Title => tasks.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
    }
}
