use async_trait::async_trait;
use log::{ debug, warn };
use serde_json::{ Map, Value as JsonValue };
use std::fs;
use std::path::{ Path, PathBuf };
use tokio::sync::Mutex;
use super::{ SessionStore, StoreError };
use crate::models::chat::{ retain_valid_messages, Message };

/// Every session lives in one JSON object on disk, rewritten in full on each `set`.
///
/// The lock only serializes writers inside this process. Two processes sharing the
/// file overwrite each other and the last full write wins.
pub struct JsonFileStore {
    path: PathBuf,
    db: Mutex<Map<String, JsonValue>>,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let db = load_db(&path);
        debug!("Loaded {} session(s) from {}", db.len(), path.display());
        Self { path, db: Mutex::new(db) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_db(path: &Path) -> Map<String, JsonValue> {
    if !path.exists() {
        return Map::new();
    }
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to read history file '{}': {}", path.display(), e);
            return Map::new();
        }
    };
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<JsonValue>(&raw) {
        Ok(JsonValue::Object(map)) => map,
        Ok(_) => {
            warn!("History file '{}' is not a JSON object, starting empty", path.display());
            Map::new()
        }
        Err(e) => {
            warn!("Failed to parse history file '{}': {}", path.display(), e);
            Map::new()
        }
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn get(&self, session_id: &str) -> Vec<Message> {
        if session_id.is_empty() {
            return Vec::new();
        }
        let db = self.db.lock().await;
        match db.get(session_id) {
            Some(JsonValue::Array(entries)) => retain_valid_messages(entries),
            _ => Vec::new(),
        }
    }

    async fn set(&self, session_id: &str, messages: Vec<Message>) -> Result<(), StoreError> {
        if session_id.is_empty() {
            return Ok(());
        }
        let mut db = self.db.lock().await;
        // Memory only changes once the file does.
        let mut next = db.clone();
        next.insert(session_id.to_string(), serde_json::to_value(&messages)?);
        let body = serde_json::to_string_pretty(&next)?;
        tokio::fs::write(&self.path, body).await?;
        *db = next;
        Ok(())
    }
}
