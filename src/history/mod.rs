mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::ServeArgs;
use crate::models::chat::Message;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("history serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported history store type: {0}")]
    UnsupportedType(String),
}

/// Session id to ordered transcript. `set` replaces the whole list.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Empty when the session is unknown, the id is blank, or the stored value is malformed.
    async fn get(&self, session_id: &str) -> Vec<Message>;

    async fn set(&self, session_id: &str, messages: Vec<Message>) -> Result<(), StoreError>;
}

pub fn create_session_store(args: &ServeArgs) -> Result<Arc<dyn SessionStore>, StoreError> {
    match args.history_type.to_lowercase().as_str() {
        "file" => {
            info!("Chat history will be stored in file: {}", args.db_file);
            Ok(Arc::new(JsonFileStore::open(&args.db_file)))
        }
        "memory" => {
            info!("Chat history will be kept in memory only");
            Ok(Arc::new(MemoryStore::default()))
        }
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}
