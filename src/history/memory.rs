use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use super::{ SessionStore, StoreError };
use crate::models::chat::Message;

#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &str) -> Vec<Message> {
        self.sessions.read().await.get(session_id).cloned().unwrap_or_default()
    }

    async fn set(&self, session_id: &str, messages: Vec<Message>) -> Result<(), StoreError> {
        if session_id.is_empty() {
            return Ok(());
        }
        self.sessions.write().await.insert(session_id.to_string(), messages);
        Ok(())
    }
}
