pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::types::BoardData;

/// Remote document store, keyed per user. `load` returning `Ok(None)` means
/// no prior data, not an error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<BoardData>, PersistError>;
    async fn save(&self, user_id: &str, data: &BoardData) -> Result<(), PersistError>;
}

/// Synchronous string key-value storage (the browser-local store in the
/// original environment). Absent keys mean no prior data.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Persistence failure taxonomy. Raw backend messages are classified once,
/// here, into a tagged variant; call sites match on the variant instead of
/// re-inspecting strings.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Stored data is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl PersistError {
    /// Classify a raw backend error message.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("permission") || lower.contains("denied") || lower.contains("unauthorized")
        {
            PersistError::PermissionDenied(message)
        } else {
            PersistError::Backend(message)
        }
    }

    /// Message surfaced to the user. Permission problems get an actionable
    /// notice instead of a generic failure.
    pub fn user_message(&self) -> String {
        match self {
            PersistError::PermissionDenied(_) => {
                "Could not access your board: permission denied. \
                 Check the storage access rules for your account."
                    .to_string()
            }
            PersistError::Parse(_) => "Stored board data could not be read.".to_string(),
            PersistError::Backend(_) => "Could not reach board storage.".to_string(),
        }
    }
}
