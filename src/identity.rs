/// Session identity: who the board belongs to right now.
///
/// Authenticated users persist to the remote document store keyed by their
/// user id; guest sessions persist to local key-value storage. Switching
/// identity is a hard cutover — the store reloads from scratch and never
/// merges or flushes across the switch.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Identity {
    User(String),
    Guest(String),
}

impl Identity {
    pub fn id(&self) -> &str {
        match self {
            Identity::User(id) | Identity::Guest(id) => id,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest(_))
    }

    /// Short form for log lines.
    pub fn label(&self) -> String {
        match self {
            Identity::User(id) => format!("user:{id}"),
            Identity::Guest(id) => format!("guest:{id}"),
        }
    }
}

/// Generate a fresh guest session id.
pub fn new_guest_id() -> String {
    format!("guest-{}", Uuid::new_v4())
}
