/// In-memory backends: the default for embedding without a real backend and
/// the mock layer the lifecycle tests drive.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::BoardData;

use super::{KeyValueStore, PersistError, RemoteStore};

#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

/// In-memory remote document store. Counts saves and can be armed to fail
/// with a given backend message, which goes through the usual
/// classification.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    boards: Mutex<HashMap<String, BoardData>>,
    save_count: AtomicUsize,
    fail_with: Mutex<Option<String>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm every following load/save to fail with this raw message.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn stored(&self, user_id: &str) -> Option<BoardData> {
        self.boards.lock().unwrap().get(user_id).cloned()
    }

    fn check_failure(&self) -> Result<(), PersistError> {
        match self.fail_with.lock().unwrap().as_deref() {
            Some(message) => Err(PersistError::classify(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn load(&self, user_id: &str) -> Result<Option<BoardData>, PersistError> {
        self.check_failure()?;
        Ok(self.boards.lock().unwrap().get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, data: &BoardData) -> Result<(), PersistError> {
        self.check_failure()?;
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.boards
            .lock()
            .unwrap()
            .insert(user_id.to_string(), data.clone());
        Ok(())
    }
}
