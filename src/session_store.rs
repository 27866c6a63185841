use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::log_store_operation;
use crate::models::{Collection, SavedSessionState, StudySessionRecord};
use crate::storage::KeyValueStore;

pub const COLLECTIONS_KEY: &str = "flashcard-collections";
pub const HISTORY_KEY: &str = "flashcard-history";
pub const SNAPSHOT_KEY: &str = "flashcard-session-snapshot";

/// Everything the store held at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedState {
    pub collections: Vec<Collection>,
    pub history: Vec<StudySessionRecord>,
    pub snapshot: Option<SavedSessionState>,
}

/// Persistence façade that maps collections, history and the resume snapshot
/// onto three fixed keys. Every write overwrites the whole value.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read all three slots. Missing, unreadable or corrupt slots fall back to
    /// empty defaults without affecting the others; corrupt slots are cleared.
    pub async fn load_all(&self) -> LoadedState {
        let collections = self.load_slot::<Vec<Collection>>(COLLECTIONS_KEY).await;
        let history = self.load_slot::<Vec<StudySessionRecord>>(HISTORY_KEY).await;

        let snapshot = match self.load_slot::<SavedSessionState>(SNAPSHOT_KEY).await {
            Some(snapshot) if snapshot.is_resumable() => Some(snapshot),
            Some(_) => {
                log_store_operation!(
                    warn,
                    "load",
                    key = SNAPSHOT_KEY,
                    error = "snapshot is not a resumable study session"
                );
                self.discard(SNAPSHOT_KEY).await;
                None
            }
            None => None,
        };

        let loaded = LoadedState {
            collections: collections.unwrap_or_default(),
            history: history.unwrap_or_default(),
            snapshot,
        };

        tracing::info!(
            component = "session_store",
            collections = loaded.collections.len(),
            history = loaded.history.len(),
            has_snapshot = loaded.snapshot.is_some(),
            "Loaded persisted study data"
        );

        loaded
    }

    pub async fn save_collections(&self, collections: &[Collection]) -> Result<()> {
        self.write_slot(COLLECTIONS_KEY, collections).await
    }

    pub async fn save_history(&self, history: &[StudySessionRecord]) -> Result<()> {
        self.write_slot(HISTORY_KEY, history).await
    }

    pub async fn save_snapshot(&self, snapshot: &SavedSessionState) -> Result<()> {
        self.write_slot(SNAPSHOT_KEY, snapshot).await
    }

    pub async fn clear_snapshot(&self) -> Result<()> {
        self.kv.remove(SNAPSHOT_KEY).await
    }

    async fn load_slot<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log_store_operation!(warn, "load", key = key, error = e);
                return None;
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log_store_operation!(warn, "load", key = key, error = e);
                self.discard(key).await;
                None
            }
        }
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.kv.remove(key).await {
            log_store_operation!(warn, "remove", key = key, error = e);
        }
    }

    async fn write_slot<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv.set(key, &json).await
    }
}
