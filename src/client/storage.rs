use log::{ debug, warn };
use serde_json::{ Map, Value as JsonValue };
use std::collections::HashMap;
use std::fs;
use std::path::{ Path, PathBuf };
use std::sync::{ Mutex, PoisonError };
use thiserror::Error;
use uuid::Uuid;

pub const SESSION_ID_KEY: &str = "finassist_session_id_v1";
pub const HISTORY_KEY: &str = "finassist_chat_history_v1";
pub const FALLBACK_SESSION_ID: &str = "default-session";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("local storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key/value cache kept on the client, independent of the server.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON object of string values on disk. Non-string values are ignored on load.
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<Map<String, JsonValue>>,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let items = fs
            ::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<JsonValue>(&raw).ok())
            .and_then(|value| match value {
                JsonValue::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        Self { path, items: Mutex::new(items) }
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.get(key).and_then(JsonValue::as_str).map(str::to_string)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), JsonValue::String(value.to_string()));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&*items)?)?;
        Ok(())
    }
}

/// Returns the stored session id, minting and saving a new one on first use.
/// Falls back to a shared id when the storage cannot be written.
pub fn resolve_session_id(storage: &dyn LocalStorage) -> String {
    if let Some(existing) = storage.get_item(SESSION_ID_KEY).filter(|id| !id.is_empty()) {
        return existing;
    }
    let id = Uuid::new_v4().to_string();
    match storage.set_item(SESSION_ID_KEY, &id) {
        Ok(()) => {
            debug!("Created session id {}", id);
            id
        }
        Err(e) => {
            warn!("Could not save session id ({}), using '{}'", e, FALLBACK_SESSION_ID);
            FALLBACK_SESSION_ID.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct ReadOnlyStorage;

    impl LocalStorage for ReadOnlyStorage {
        fn get_item(&self, _key: &str) -> Option<String> {
            None
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro")))
        }
    }

    #[test]
    fn file_storage_round_trips_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("local-storage.json");

        FileStorage::open(&path).set_item(HISTORY_KEY, "[]").unwrap();

        assert_eq!(FileStorage::open(&path).get_item(HISTORY_KEY).as_deref(), Some("[]"));
        assert_eq!(FileStorage::open(&path).get_item(SESSION_ID_KEY), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local-storage.json");
        fs::write(&path, "{{{").unwrap();

        let storage = FileStorage::open(&path);

        assert_eq!(storage.get_item(SESSION_ID_KEY), None);
        storage.set_item(SESSION_ID_KEY, "abc").unwrap();
        assert_eq!(FileStorage::open(&path).get_item(SESSION_ID_KEY).as_deref(), Some("abc"));
    }

    #[test]
    fn session_id_is_minted_once() {
        let storage = MemoryStorage::default();

        let first = resolve_session_id(&storage);
        let second = resolve_session_id(&storage);

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn unwritable_storage_uses_fallback_id() {
        assert_eq!(resolve_session_id(&ReadOnlyStorage), FALLBACK_SESSION_ID);
    }
}
