//! Kanban board state store.
//!
//! Owns the canonical in-memory tasks/columns, applies every mutation
//! through a single sequential action dispatcher, and persists state
//! (debounced) to a backend selected by the active identity: a remote
//! document store for authenticated users, local key-value storage for
//! guest sessions. AI-assisted suggestions sit behind a bounded-retry
//! envelope with typed failure classification.
//!
//! The reducer is total and synchronous; all fallibility lives at the
//! load/save and suggestion boundaries, where errors surface as state data
//! rather than crossing the dispatch interface.

pub mod columns;
pub mod debounce;
pub mod filter;
pub mod identity;
pub mod reducer;
pub mod storage;
pub mod store;
pub mod suggest;
pub mod types;

pub use identity::Identity;
pub use reducer::BoardAction;
pub use store::{BoardStore, Lifecycle, StoreConfig};
pub use types::{BoardData, BoardState, Column, Priority, Recurrence, Subtask, Task};
