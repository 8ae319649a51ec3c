/// The board store: canonical in-memory tasks/columns plus the persistence
/// lifecycle around them.
///
/// All mutations flow through `dispatch`, one action at a time. Structural
/// changes while Ready schedule a debounced save to the backend selected by
/// the current identity (remote document store for users, key-value storage
/// for guests). Identity switches are hard cutovers: the pending save is
/// aborted, state resets to empty defaults, and the new identity's data is
/// loaded from scratch.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::debounce::Debounce;
use crate::identity::Identity;
use crate::reducer::{apply, BoardAction};
use crate::storage::{local, KeyValueStore, RemoteStore};
use crate::types::{BoardData, BoardState};

const DEFAULT_DEBOUNCE_MS: u64 = 1500;

/// Persistence lifecycle phase, derived from state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Quiet period before a scheduled save runs. Edits within the window
    /// coalesce into one write.
    #[serde(default = "default_debounce", with = "duration_ms", rename = "debounceMs")]
    pub debounce: Duration,
}

fn default_debounce() -> Duration {
    Duration::from_millis(DEFAULT_DEBOUNCE_MS)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
        }
    }
}

mod duration_ms {
    use super::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

pub struct BoardStore<R, K> {
    state: BoardState,
    remote: Arc<R>,
    local: Arc<K>,
    identity: Option<Identity>,
    /// Bumped on every identity change; scheduled saves carry the value they
    /// were created under and skip the write if it moved on.
    generation: Arc<AtomicU64>,
    save_error: Arc<Mutex<Option<String>>>,
    debounce: Debounce,
    config: StoreConfig,
}

impl<R, K> BoardStore<R, K>
where
    R: RemoteStore + 'static,
    K: KeyValueStore + 'static,
{
    pub fn new(remote: Arc<R>, local: Arc<K>) -> Self {
        Self::with_config(remote, local, StoreConfig::default())
    }

    pub fn with_config(remote: Arc<R>, local: Arc<K>, config: StoreConfig) -> Self {
        Self {
            state: BoardState::empty(),
            remote,
            local,
            identity: None,
            generation: Arc::new(AtomicU64::new(0)),
            save_error: Arc::new(Mutex::new(None)),
            debounce: Debounce::new(),
            config,
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.state.is_loading {
            Lifecycle::Loading
        } else if self.state.is_initialized {
            Lifecycle::Ready
        } else {
            Lifecycle::Uninitialized
        }
    }

    pub fn save_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Latest save failure reported by a background write, if any.
    pub fn take_save_error(&mut self) -> Option<String> {
        self.save_error.lock().unwrap().take()
    }

    /// Switch the active identity and rehydrate from its backend.
    ///
    /// The pending debounced save for the previous identity is discarded,
    /// never flushed. Holding `&mut self` across the load means a newer
    /// switch cannot interleave with this one; the generation bump keeps any
    /// already-spawned save from writing under the old identity.
    pub async fn set_identity(&mut self, identity: Option<Identity>) {
        self.debounce.cancel();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.save_error.lock().unwrap().take();
        self.identity = identity;
        self.state = BoardState::loading();

        let Some(identity) = self.identity.clone() else {
            // No session at all: empty board, nothing will ever save.
            self.state.is_loading = false;
            self.state.is_initialized = true;
            return;
        };

        log::info!(
            "[boardstore.store.load] Loading board for {}",
            identity.label()
        );

        let loaded = match &identity {
            Identity::User(id) => self
                .remote
                .load(id)
                .await
                .map(|data| data.unwrap_or_default()),
            Identity::Guest(_) => local::load_guest_board(self.local.as_ref()),
        };

        let now = Utc::now();
        match loaded {
            Ok(data) => {
                apply(
                    &mut self.state,
                    BoardAction::SetInitialData {
                        tasks: data.tasks,
                        columns: data.columns,
                    },
                    now,
                );
            }
            Err(err) => {
                // Graceful degradation: report, but become Ready with an
                // empty board rather than staying stuck.
                log::error!(
                    "[boardstore.store.load] Load failed for {}: {}",
                    identity.label(),
                    err
                );
                apply(
                    &mut self.state,
                    BoardAction::SetInitialData {
                        tasks: Vec::new(),
                        columns: Vec::new(),
                    },
                    now,
                );
                self.state.error = Some(err.user_message());
            }
        }
    }

    /// Dispatch an action at the current wall clock.
    pub fn dispatch(&mut self, action: BoardAction) {
        self.dispatch_at(action, Utc::now());
    }

    /// Dispatch with an explicit clock (test seam; production callers use
    /// `dispatch`).
    pub fn dispatch_at(&mut self, action: BoardAction, now: DateTime<Utc>) {
        if let Some(err) = self.save_error.lock().unwrap().take() {
            self.state.error = Some(err);
        }

        let initial_load = matches!(action, BoardAction::SetInitialData { .. });
        let changed = apply(&mut self.state, action, now);
        if initial_load || !changed {
            return;
        }
        if self.lifecycle() != Lifecycle::Ready {
            return;
        }
        let Some(identity) = self.identity.clone() else {
            return;
        };
        self.schedule_save(identity);
    }

    fn schedule_save(&mut self, identity: Identity) {
        let snapshot = BoardData {
            tasks: self.state.tasks.clone(),
            columns: self.state.columns.clone(),
        };
        let remote = self.remote.clone();
        let local_kv = self.local.clone();
        let generation = self.generation.clone();
        let expected = generation.load(Ordering::SeqCst);
        let save_error = self.save_error.clone();

        self.debounce.schedule(self.config.debounce, async move {
            if generation.load(Ordering::SeqCst) != expected {
                log::debug!(
                    "[boardstore.store.save] Discarding stale save for {}",
                    identity.label()
                );
                return;
            }
            let result = match &identity {
                Identity::User(id) => remote.save(id, &snapshot).await,
                Identity::Guest(_) => local::save_guest_board(local_kv.as_ref(), &snapshot),
            };
            match result {
                Ok(()) => log::debug!(
                    "[boardstore.store.save] Saved board for {} ({} tasks)",
                    identity.label(),
                    snapshot.tasks.len()
                ),
                Err(err) => {
                    log::error!(
                        "[boardstore.store.save] Save failed for {}: {}",
                        identity.label(),
                        err
                    );
                    *save_error.lock().unwrap() = Some(err.user_message());
                }
            }
        });
    }
}
