use log::{ debug, info, warn };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use tokio::sync::broadcast;
use crate::models::chat::{ parse_message_list, Message };
use super::quota::QuotaRefresh;
use super::storage::{ resolve_session_id, LocalStorage, StorageError, HISTORY_KEY };
use super::transport::ChatTransport;

pub const GREETING: &str =
    "Halo! Saya FinAssistant, asisten keuangan pribadi Anda. Ada yang bisa saya bantu \
dengan pencatatan transaksi atau laporan keuangan hari ini?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    Idle,
    Loading,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or a send was already in flight.
    Ignored,
    Replied(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapSource {
    Server,
    LocalCache,
    Default,
}

#[derive(Debug)]
struct ConversationState {
    messages: Vec<Message>,
    status: SendStatus,
}

impl ConversationState {
    /// Tentatively appends the user turn and returns the history to send.
    fn begin(&mut self, message: Message) -> Vec<Message> {
        self.messages.push(message);
        self.status = SendStatus::Loading;
        self.messages.clone()
    }

    fn commit(&mut self, reply: Message) {
        self.messages.push(reply);
        self.status = SendStatus::Idle;
    }

    /// Drops the most recent entry, which is the tentative user turn while sends are serialized.
    fn revert(&mut self, error: String) {
        self.messages.pop();
        self.status = SendStatus::Error(error);
    }
}

pub struct ConversationController {
    transport: Arc<dyn ChatTransport>,
    storage: Arc<dyn LocalStorage>,
    session_id: String,
    state: Mutex<ConversationState>,
    quota_refresh: broadcast::Sender<QuotaRefresh>,
}

impl ConversationController {
    pub fn new(transport: Arc<dyn ChatTransport>, storage: Arc<dyn LocalStorage>) -> Self {
        let session_id = resolve_session_id(storage.as_ref());
        Self::with_session_id(transport, storage, session_id)
    }

    pub fn with_session_id(
        transport: Arc<dyn ChatTransport>,
        storage: Arc<dyn LocalStorage>,
        session_id: impl Into<String>
    ) -> Self {
        let (quota_refresh, _) = broadcast::channel(16);
        Self {
            transport,
            storage,
            session_id: session_id.into(),
            state: Mutex::new(ConversationState {
                messages: vec![Message::assistant(GREETING)],
                status: SendStatus::Idle,
            }),
            quota_refresh,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn status(&self) -> SendStatus {
        self.state().status.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().status == SendStatus::Loading
    }

    /// Fires once after every send that reached the transport.
    pub fn subscribe_quota_refresh(&self) -> broadcast::Receiver<QuotaRefresh> {
        self.quota_refresh.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Server history wins when it has anything; otherwise the local cache is
    /// accepted only if every entry is well formed.
    pub async fn bootstrap(&self) -> BootstrapSource {
        let server_history = self.transport.load_history(&self.session_id).await;
        if !server_history.is_empty() {
            info!(
                "Restored {} message(s) for session {} from the server",
                server_history.len(),
                self.session_id
            );
            self.replace_messages(server_history);
            return BootstrapSource::Server;
        }

        match self.restore_cached() {
            Some(cached) => {
                info!("Restored {} message(s) from the local cache", cached.len());
                self.replace_messages(cached);
                BootstrapSource::LocalCache
            }
            None => BootstrapSource::Default,
        }
    }

    pub async fn send(&self, input: &str) -> SendOutcome {
        if input.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        let history = {
            let mut state = self.state();
            if state.status == SendStatus::Loading {
                debug!("Send ignored while another is in flight");
                return SendOutcome::Ignored;
            }
            let history = state.begin(Message::user(input));
            self.persist(&state.messages);
            history
        };

        let result = self.transport.send_message(&history, &self.session_id).await;

        let outcome = {
            let mut state = self.state();
            let outcome = match result {
                Ok(text) => {
                    state.commit(Message::assistant(text.clone()));
                    SendOutcome::Replied(text)
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!("Send failed, rolling back user message: {}", message);
                    state.revert(message.clone());
                    SendOutcome::Failed(message)
                }
            };
            self.persist(&state.messages);
            outcome
        };

        let _ = self.quota_refresh.send(QuotaRefresh);
        outcome
    }

    fn replace_messages(&self, messages: Vec<Message>) {
        let mut state = self.state();
        state.messages = messages;
        self.persist(&state.messages);
    }

    fn restore_cached(&self) -> Option<Vec<Message>> {
        let raw = self.storage.get_item(HISTORY_KEY)?;
        let value = serde_json::from_str::<serde_json::Value>(&raw).ok()?;
        let messages = parse_message_list(&value);
        if messages.is_none() {
            debug!("Discarding malformed local history cache");
        }
        messages
    }

    fn persist(&self, messages: &[Message]) {
        let result = serde_json
            ::to_string(messages)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set_item(HISTORY_KEY, &json));
        if let Err(e) = result {
            debug!("Local history cache not updated: {}", e);
        }
    }
}
