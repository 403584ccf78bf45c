use crate::history::SessionStore;
use crate::llm::chat::ChatClient;
use crate::models::api::{ ChatReply, ChatRequest, QuotaStatus, SessionHistory };
use crate::models::chat::{ Message, Role };
use crate::quota::QuotaTracker;
use super::error::ApiError;
use std::convert::Infallible;
use std::net::{ IpAddr, Ipv4Addr, SocketAddr };
use std::num::NonZeroU32;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ ConnectInfo, FromRequestParts, State, rejection::JsonRejection },
    http::request::Parts,
};
use governor::{ DefaultDirectRateLimiter, Quota, RateLimiter };
use serde_json::Value as JsonValue;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error, debug };

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub chat_client: Arc<dyn ChatClient>,
    pub quota: Arc<QuotaTracker>,
    pub limit_message: String,
    pub rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
    pub max_history_messages: usize,
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SessionStore>,
        chat_client: Arc<dyn ChatClient>,
        quota: Arc<QuotaTracker>,
        limit_message: String
    ) -> Self {
        Self {
            store,
            chat_client,
            quota,
            limit_message,
            rate_limiter: None,
            max_history_messages: 20,
            trust_forwarded_for: false,
        }
    }

    /// `0` leaves chat requests unthrottled.
    pub fn with_rate_per_second(mut self, per_second: u32) -> Self {
        self.rate_limiter = NonZeroU32::new(per_second).map(|n|
            Arc::new(RateLimiter::direct(Quota::per_second(n)))
        );
        self
    }

    pub fn with_max_history_messages(mut self, max: usize) -> Self {
        self.max_history_messages = max;
        self
    }

    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}

/// Address used for quota accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState
    ) -> Result<Self, Self::Rejection> {
        if state.trust_forwarded_for {
            let forwarded = parts.headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok());
            if let Some(ip) = forwarded {
                return Ok(ClientIp(ip));
            }
        }
        let peer = parts.extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        Ok(ClientIp(peer))
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/session/load", post(load_session_handler))
        .route("/api/quota", get(quota_handler))
        .layer(cors)
        .with_state(state)
}

fn recent_window(history: &[Message], max: usize) -> &[Message] {
    if max == 0 || history.len() <= max {
        history
    } else {
        &history[history.len() - max..]
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    client: ClientIp,
    payload: Result<Json<ChatRequest>, JsonRejection>
) -> Result<Json<ChatReply>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            warn!("Global chat rate limit exceeded, rejecting request from {}", client.0);
            return Err(ApiError::RateLimited);
        }
    }

    match req.history.last() {
        None => {
            return Err(ApiError::BadRequest("history must not be empty".into()));
        }
        Some(last) if last.role != Role::User => {
            return Err(ApiError::BadRequest("last message must come from the user".into()));
        }
        Some(_) => {}
    }

    let remaining = state.quota.try_acquire(client.0).map_err(|_| {
        info!("Daily quota exhausted for {}", client.0);
        ApiError::QuotaExceeded(state.limit_message.clone())
    })?;
    debug!("{} has {}/{} requests left today", client.0, remaining.remaining, remaining.limit);

    let window = recent_window(&req.history, state.max_history_messages);
    let reply = match state.chat_client.chat(window).await {
        Ok(completion) => completion.response,
        Err(e) => {
            error!("Chat completion failed for {}: {}", client.0, e);
            state.quota.release(client.0);
            return Err(ApiError::Upstream);
        }
    };

    if let Some(session_id) = req.session_id.as_deref().filter(|id| !id.trim().is_empty()) {
        let mut transcript = req.history;
        transcript.push(Message::assistant(reply.clone()));
        if let Err(e) = state.store.set(session_id, transcript).await {
            warn!("Failed to persist session {}: {}", session_id, e);
        }
    }

    Ok(Json(ChatReply { text: reply }))
}

async fn load_session_handler(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>
) -> Result<Json<SessionHistory>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session_id = body
        .get("sessionId")
        .and_then(JsonValue::as_str)
        .unwrap_or_default();

    let history = state.store.get(session_id).await;
    debug!("Loaded {} message(s) for session '{}'", history.len(), session_id);
    Ok(Json(SessionHistory { history }))
}

async fn quota_handler(State(state): State<AppState>, client: ClientIp) -> Json<QuotaStatus> {
    Json(state.quota.status(client.0))
}
