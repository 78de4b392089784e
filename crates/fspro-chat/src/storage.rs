//! Persistence of the conversation list and the active-session snapshot.
//!
//! The adapter sits on top of a plain string key/value store (`localStorage`
//! in the browser, [`MemoryStore`] in tests) and never fails a load: bad data
//! is reported back as warnings and replaced with empty state.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use fspro_types::{ActiveSnapshot, Conversation, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Minimal string key/value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory store, used in tests and when `localStorage` is unavailable
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// The two keys the adapter writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub conversations: String,
    pub active_session: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            conversations: format!("{}.conversations", prefix),
            active_session: format!("{}.active_session", prefix),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("fspro")
    }
}

/// Result of [`StorageAdapter::load`]
#[derive(Debug, Default)]
pub struct LoadedState {
    pub conversations: Vec<Conversation>,
    pub active: Option<ActiveSnapshot>,
    /// Problems found while reading; the affected parts were replaced with empty state
    pub warnings: Vec<StorageError>,
}

pub struct StorageAdapter<S> {
    store: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> StorageAdapter<S> {
    pub fn new(store: S, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Read persisted state.
    ///
    /// Each key is read independently: a malformed conversation list does not
    /// discard a valid active snapshot and vice versa. Duplicate conversation
    /// ids are collapsed, keeping the first occurrence.
    pub fn load(&self) -> LoadedState {
        let mut state = LoadedState::default();

        match self.read_json::<Vec<Conversation>>(&self.keys.conversations) {
            Ok(Some(conversations)) => {
                let mut seen = HashSet::new();
                for convo in conversations {
                    if seen.insert(convo.id.clone()) {
                        state.conversations.push(convo);
                    } else {
                        state.warnings.push(StorageError::Malformed {
                            key: self.keys.conversations.clone(),
                            reason: format!("duplicate conversation id {}", convo.id),
                        });
                    }
                }
            }
            Ok(None) => {}
            Err(e) => state.warnings.push(e),
        }

        match self.read_json::<ActiveSnapshot>(&self.keys.active_session) {
            Ok(active) => state.active = active.filter(|snapshot| !snapshot.is_empty_draft()),
            Err(e) => state.warnings.push(e),
        }

        state
    }

    /// Write the conversation list and the active snapshot.
    ///
    /// `None` removes the active-session key.
    pub fn save(
        &self,
        conversations: &[Conversation],
        active: Option<&ActiveSnapshot>,
    ) -> Result<(), StorageError> {
        self.write_json(&self.keys.conversations, conversations)?;
        match active {
            Some(snapshot) => self.write_json(&self.keys.active_session, snapshot),
            None => self.store.remove(&self.keys.active_session),
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(key, &json)
    }
}
