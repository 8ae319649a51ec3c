/// Column membership derivation.
///
/// `task_ids` on a column is a cached view over `task.column_id`, never an
/// independent source of truth. Every structural mutation re-derives it
/// through `derive_columns`, so the partition invariant (each task id listed
/// exactly once, in the column its `column_id` names) is enforced in one
/// place rather than replicated per action.
use crate::types::{default_columns, Column, Task, COLUMN_TODO};

/// Rebuild the four fixed columns from the task list.
///
/// Stored/previous columns contribute their titles and intra-column order;
/// ids whose task is gone or has moved are dropped, and task ids missing
/// from their own column are appended in task-list order.
pub fn derive_columns(tasks: &[Task], previous: &[Column]) -> Vec<Column> {
    default_columns()
        .into_iter()
        .map(|mut col| {
            if let Some(prev) = previous.iter().find(|c| c.id == col.id) {
                col.title = prev.title.clone();
                col.task_ids = prev
                    .task_ids
                    .iter()
                    .filter(|id| tasks.iter().any(|t| t.id == **id && t.column_id == col.id))
                    .cloned()
                    .collect();
            }
            for task in tasks {
                if task.column_id == col.id && !col.task_ids.contains(&task.id) {
                    col.task_ids.push(task.id.clone());
                }
            }
            col
        })
        .collect()
}

/// Repair tasks whose `column_id` names no known column (possible in stale
/// guest storage). They land in the first default column.
pub fn normalize_tasks(mut tasks: Vec<Task>) -> Vec<Task> {
    let known: Vec<String> = default_columns().into_iter().map(|c| c.id).collect();
    for task in &mut tasks {
        if !known.contains(&task.column_id) {
            log::warn!(
                "[boardstore.columns.normalize] Task {} had unknown column {:?}, moved to {}",
                task.id,
                task.column_id,
                COLUMN_TODO
            );
            task.column_id = COLUMN_TODO.to_string();
        }
    }
    tasks
}

/// True when task ids partition correctly across columns: every task id in
/// exactly one column, and that column matches its `column_id`.
#[cfg(test)]
pub fn partition_holds(tasks: &[Task], columns: &[Column]) -> bool {
    let mut seen = std::collections::HashSet::new();
    for col in columns {
        for id in &col.task_ids {
            if !seen.insert(id.clone()) {
                return false;
            }
            match tasks.iter().find(|t| t.id == *id) {
                Some(t) if t.column_id == col.id => {}
                _ => return false,
            }
        }
    }
    tasks.iter().all(|t| seen.contains(&t.id))
}
