/// Guest-session persistence over a key-value store.
///
/// Tasks and columns live under two fixed keys as JSON; dates serialize
/// through chrono's textual forms (RFC 3339 timestamps, ISO dates). Loading
/// reconciles stored columns against the fixed four-column template so the
/// defaults survive partial or stale storage, and filters task ids that no
/// longer resolve to a task.
use crate::columns::{derive_columns, normalize_tasks};
use crate::types::{BoardData, Column, Task};

use super::{KeyValueStore, PersistError};

pub const KEY_TASKS: &str = "boardstore.tasks";
pub const KEY_COLUMNS: &str = "boardstore.columns";

/// Load the guest board. Missing keys yield an empty default board.
pub fn load_guest_board<K: KeyValueStore + ?Sized>(kv: &K) -> Result<BoardData, PersistError> {
    let tasks: Vec<Task> = match kv.get(KEY_TASKS) {
        Some(raw) => serde_json::from_str(&raw)?,
        None => Vec::new(),
    };
    let stored_columns: Vec<Column> = match kv.get(KEY_COLUMNS) {
        Some(raw) => serde_json::from_str(&raw)?,
        None => Vec::new(),
    };

    let tasks = normalize_tasks(tasks);
    let columns = derive_columns(&tasks, &stored_columns);
    log::debug!(
        "[boardstore.local.load] Loaded guest board: {} tasks",
        tasks.len()
    );
    Ok(BoardData { tasks, columns })
}

/// Persist the guest board under the fixed keys.
pub fn save_guest_board<K: KeyValueStore + ?Sized>(
    kv: &K,
    data: &BoardData,
) -> Result<(), PersistError> {
    kv.set(KEY_TASKS, &serde_json::to_string(&data.tasks)?);
    kv.set(KEY_COLUMNS, &serde_json::to_string(&data.columns)?);
    log::debug!(
        "[boardstore.local.save] Saved guest board: {} tasks",
        data.tasks.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::partition_holds;
    use crate::storage::memory::MemoryKv;
    use crate::types::{default_columns, COLUMN_DONE, COLUMN_TODO};
    use chrono::Utc;

    #[test]
    fn test_empty_store_yields_default_board() {
        let kv = MemoryKv::new();
        let data = load_guest_board(&kv).unwrap();
        assert!(data.tasks.is_empty());
        assert_eq!(data.columns.len(), 4);
        assert_eq!(data.columns[0].id, COLUMN_TODO);
    }

    #[test]
    fn test_round_trip() {
        let kv = MemoryKv::new();
        let task = Task::new("persisted", COLUMN_DONE, Utc::now());
        let tasks = vec![task.clone()];
        let columns = derive_columns(&tasks, &[]);
        save_guest_board(&kv, &BoardData { tasks, columns }).unwrap();

        let data = load_guest_board(&kv).unwrap();
        assert_eq!(data.tasks, vec![task.clone()]);
        assert_eq!(data.columns[3].task_ids, vec![task.id]);
    }

    #[test]
    fn test_partial_storage_keeps_all_defaults() {
        let kv = MemoryKv::new();
        // Only two of the four columns were ever stored.
        let stored = vec![default_columns().remove(0)];
        kv.set(KEY_COLUMNS, &serde_json::to_string(&stored).unwrap());

        let data = load_guest_board(&kv).unwrap();
        assert_eq!(data.columns.len(), 4);
    }

    #[test]
    fn test_stale_task_ids_filtered() {
        let kv = MemoryKv::new();
        let mut columns = default_columns();
        columns[0].task_ids.push("deleted-long-ago".to_string());
        kv.set(KEY_COLUMNS, &serde_json::to_string(&columns).unwrap());

        let data = load_guest_board(&kv).unwrap();
        assert!(data.columns[0].task_ids.is_empty());
        assert!(partition_holds(&data.tasks, &data.columns));
    }

    #[test]
    fn test_corrupt_json_surfaces_parse_error() {
        let kv = MemoryKv::new();
        kv.set(KEY_TASKS, "{not json");
        assert!(matches!(
            load_guest_board(&kv),
            Err(PersistError::Parse(_))
        ));
    }
}
