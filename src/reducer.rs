/// The board reducer: a total, synchronous dispatcher over `BoardState`.
///
/// Actions apply one at a time; each fully applies before the next is
/// processed. Missing ids and unknown target columns are no-ops — nothing
/// here fails or panics. Fallibility lives entirely in the load/save
/// lifecycle around the store.
///
/// `now` is an explicit parameter so timer and recurrence behavior is fully
/// deterministic under test.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::columns::normalize_tasks;
use crate::types::{
    BoardState, Column, Subtask, Task, COLUMN_DONE, COLUMN_IN_PROGRESS, COLUMN_REVIEW, COLUMN_TODO,
};

#[derive(Debug, Clone)]
pub enum BoardAction {
    /// Wholesale replacement after a backend load.
    SetInitialData { tasks: Vec<Task>, columns: Vec<Column> },
    AddTask(Task),
    /// Replace a task by id; a changed `column_id` moves it between columns.
    UpdateTask(Task),
    DeleteTask { id: String },
    MoveTask {
        id: String,
        column_id: String,
        index: Option<usize>,
    },
    AddSubtask { task_id: String, subtask: Subtask },
    UpdateSubtask { task_id: String, subtask: Subtask },
    DeleteSubtask { task_id: String, subtask_id: String },
    ToggleSubtask { task_id: String, subtask_id: String },
    StartTimer { task_id: String },
    StopTimer { task_id: String },
}

/// Apply one action. Returns true when tasks or columns actually changed
/// (the store uses this to decide whether a save is due).
pub fn apply(state: &mut BoardState, action: BoardAction, now: DateTime<Utc>) -> bool {
    match action {
        BoardAction::SetInitialData { tasks, columns } => {
            state.tasks = normalize_tasks(tasks);
            state.columns = columns;
            state.rederive_columns();
            state.is_loading = false;
            state.is_initialized = true;
            true
        }

        BoardAction::AddTask(mut task) => {
            if state.tasks.iter().any(|t| t.id == task.id) {
                return false;
            }
            if state.column(&task.column_id).is_none() {
                task.column_id = COLUMN_TODO.to_string();
            }
            state.tasks.push(task);
            state.rederive_columns();
            true
        }

        BoardAction::UpdateTask(mut task) => {
            if state.column(&task.column_id).is_none() {
                task.column_id = COLUMN_TODO.to_string();
            }
            let Some(slot) = state.tasks.iter_mut().find(|t| t.id == task.id) else {
                return false;
            };
            task.updated_at = now;
            *slot = task;
            state.rederive_columns();
            true
        }

        BoardAction::DeleteTask { id } => {
            let before = state.tasks.len();
            state.tasks.retain(|t| t.id != id);
            if state.tasks.len() == before {
                return false;
            }
            state.rederive_columns();
            true
        }

        BoardAction::MoveTask { id, column_id, index } => move_task(state, &id, &column_id, index, now),

        BoardAction::AddSubtask { task_id, subtask } => with_task(state, &task_id, now, |t| {
            t.subtasks.push(subtask);
        }),

        BoardAction::UpdateSubtask { task_id, subtask } => with_task(state, &task_id, now, |t| {
            if let Some(slot) = t.subtasks.iter_mut().find(|s| s.id == subtask.id) {
                *slot = subtask;
            }
        }),

        BoardAction::DeleteSubtask { task_id, subtask_id } => with_task(state, &task_id, now, |t| {
            t.subtasks.retain(|s| s.id != subtask_id);
        }),

        BoardAction::ToggleSubtask { task_id, subtask_id } => with_task(state, &task_id, now, |t| {
            if let Some(sub) = t.subtasks.iter_mut().find(|s| s.id == subtask_id) {
                sub.completed = !sub.completed;
            }
        }),

        BoardAction::StartTimer { task_id } => with_task(state, &task_id, now, |t| {
            // Restarting a running timer would drop elapsed time.
            if t.timer_started_at.is_none() {
                t.timer_started_at = Some(now);
            }
        }),

        BoardAction::StopTimer { task_id } => with_task(state, &task_id, now, |t| {
            stop_timer(t, now);
        }),
    }
}

fn with_task<F: FnOnce(&mut Task)>(
    state: &mut BoardState,
    task_id: &str,
    now: DateTime<Utc>,
    mutate: F,
) -> bool {
    let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) else {
        return false;
    };
    mutate(task);
    task.updated_at = now;
    true
}

/// Fold elapsed whole seconds into the accumulator and clear the timer.
/// No-op when the timer is not running; a clock that went backwards
/// contributes zero rather than subtracting.
fn stop_timer(task: &mut Task, now: DateTime<Utc>) {
    if let Some(started) = task.timer_started_at.take() {
        let elapsed = (now - started).num_seconds().max(0) as u64;
        task.time_spent_seconds += elapsed;
    }
}

/// MoveTask: timer auto-stop, column reassignment, membership re-derivation,
/// explicit index placement, recurrence spawn — in that order.
fn move_task(
    state: &mut BoardState,
    id: &str,
    new_column: &str,
    index: Option<usize>,
    now: DateTime<Utc>,
) -> bool {
    if state.column(new_column).is_none() {
        return false;
    }
    let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
        return false;
    };
    let old_column = task.column_id.clone();

    // The work timer ticks only while a task is actively worked: force-close
    // it when leaving inprogress or landing in review/done.
    let leaving_active = old_column == COLUMN_IN_PROGRESS && new_column != COLUMN_IN_PROGRESS;
    let entering_closed = new_column == COLUMN_DONE || new_column == COLUMN_REVIEW;
    if task.timer_active() && (leaving_active || entering_closed) {
        stop_timer(task, now);
    }

    task.column_id = new_column.to_string();
    task.updated_at = now;

    // Completing a recurring task with a due date spawns its successor in
    // todo; the original stays behind as the completed record. Only an
    // actual entry into done counts — reorders within done spawn nothing.
    if new_column == COLUMN_DONE && old_column != COLUMN_DONE {
        if let (Some(rule), Some(due)) = (task.recurrence, task.due_date) {
            let mut next = task.clone();
            next.id = Uuid::new_v4().to_string();
            next.column_id = COLUMN_TODO.to_string();
            next.due_date = Some(rule.advance(due));
            next.created_at = now;
            next.updated_at = now;
            next.time_spent_seconds = 0;
            next.timer_started_at = None;
            for sub in &mut next.subtasks {
                sub.completed = false;
            }
            log::info!(
                "[boardstore.reducer.recur] Task {} completed, spawned successor {} due {:?}",
                id,
                next.id,
                next.due_date
            );
            state.tasks.push(next);
        }
    }

    state.rederive_columns();

    if let Some(index) = index {
        if let Some(col) = state.columns.iter_mut().find(|c| c.id == new_column) {
            if let Some(pos) = col.task_ids.iter().position(|t| t == id) {
                let task_id = col.task_ids.remove(pos);
                let index = index.min(col.task_ids.len());
                col.task_ids.insert(index, task_id);
            }
        }
    }
    true
}
