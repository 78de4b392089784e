use fspro_chat::{KeyValueStore, MemoryStore, StorageError};
use web_sys::{Storage, Window};

/// `localStorage`, or an in-memory map when the browser refuses it
/// (private mode, disabled storage, sandboxed frames)
pub enum BrowserStore {
    Local(Storage),
    Memory(MemoryStore),
}

impl BrowserStore {
    pub fn open(window: &Window) -> Self {
        match window.local_storage() {
            Ok(Some(storage)) => BrowserStore::Local(storage),
            Ok(None) => Self::fallback(StorageError::Unavailable(
                "localStorage is not provided by this browser".to_string(),
            )),
            Err(e) => Self::fallback(StorageError::Unavailable(format!(
                "localStorage access denied: {:?}",
                e
            ))),
        }
    }

    /// In-memory store used when `localStorage` cannot be opened
    pub fn fallback(error: StorageError) -> Self {
        log::warn!("{}; history will not be kept", error);
        BrowserStore::Memory(MemoryStore::new())
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, BrowserStore::Local(_))
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            BrowserStore::Local(storage) => storage.get_item(key).map_err(|e| StorageError::Read {
                key: key.to_string(),
                reason: format!("{:?}", e),
            }),
            BrowserStore::Memory(memory) => memory.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            // Quota errors land here
            BrowserStore::Local(storage) => storage.set_item(key, value).map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            }),
            BrowserStore::Memory(memory) => memory.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            BrowserStore::Local(storage) => storage.remove_item(key).map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            }),
            BrowserStore::Memory(memory) => memory.remove(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_memory_fallback_round_trips() {
        let store = BrowserStore::fallback(StorageError::Unavailable("blocked".to_string()));
        assert!(!store.is_persistent());
        store.set("fspro.conversations", "[]").unwrap();
        assert_eq!(store.get("fspro.conversations").unwrap().as_deref(), Some("[]"));

        store.remove("fspro.conversations").unwrap();
        assert_eq!(store.get("fspro.conversations").unwrap(), None);
    }

    #[wasm_bindgen_test]
    fn test_unavailable_error_message() {
        let error = StorageError::Unavailable("localStorage access denied".to_string());
        assert_eq!(error.to_string(), "storage unavailable: localStorage access denied");
    }
}
