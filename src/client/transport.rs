use async_trait::async_trait;
use log::{ debug, error };
use reqwest::Client as HttpClient;
use serde_json::Value as JsonValue;
use thiserror::Error;
use crate::models::api::{ ChatReply, ChatRequest, ErrorBody, QuotaStatus };
use crate::models::chat::{ retain_valid_messages, Message };

pub const UNREACHABLE_MESSAGE: &str =
    "Gagal terhubung ke server. Pastikan server berjalan dan alamatnya benar.";

#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived at all.
    #[error("{}", UNREACHABLE_MESSAGE)]
    Unreachable,
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Failed to get response from the assistant.")]
    Decode(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        history: &[Message],
        session_id: &str
    ) -> Result<String, TransportError>;

    /// Best effort: any failure yields an empty history.
    async fn load_history(&self, session_id: &str) -> Vec<Message>;

    async fn fetch_quota(&self) -> Result<QuotaStatus, TransportError>;
}

pub struct HttpTransport {
    http: HttpClient,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(HttpClient::new(), base_url)
    }

    pub fn with_client(http: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }
}

async fn api_error(resp: reqwest::Response) -> TransportError {
    let status = resp.status().as_u16();
    let message = resp
        .json::<ErrorBody>().await
        .ok()
        .and_then(|body| body.error)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| format!("Request failed ({})", status));
    TransportError::Api { status, message }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send_message(
        &self,
        history: &[Message],
        session_id: &str
    ) -> Result<String, TransportError> {
        let body = ChatRequest {
            history: history.to_vec(),
            session_id: Some(session_id.to_string()),
        };
        let resp = self.http
            .post(self.url("/api/chat"))
            .json(&body)
            .send().await
            .map_err(|e| {
                error!("Chat request failed: {}", e);
                TransportError::Unreachable
            })?;

        if !resp.status().is_success() {
            let err = api_error(resp).await;
            error!("Chat request rejected: {}", err);
            return Err(err);
        }

        let reply = resp.json::<ChatReply>().await.map_err(|e| {
            error!("Malformed chat reply: {}", e);
            TransportError::Decode(e.to_string())
        })?;
        Ok(reply.text)
    }

    async fn load_history(&self, session_id: &str) -> Vec<Message> {
        let resp = match
            self.http
                .post(self.url("/api/session/load"))
                .json(&serde_json::json!({ "sessionId": session_id }))
                .send().await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!("Session load returned {}", resp.status());
                return Vec::new();
            }
            Err(e) => {
                debug!("Session load failed: {}", e);
                return Vec::new();
            }
        };

        match resp.json::<JsonValue>().await {
            Ok(body) =>
                body
                    .get("history")
                    .and_then(JsonValue::as_array)
                    .map(|entries| retain_valid_messages(entries))
                    .unwrap_or_default(),
            Err(e) => {
                debug!("Session load payload unreadable: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_quota(&self) -> Result<QuotaStatus, TransportError> {
        let resp = self.http
            .get(self.url("/api/quota"))
            .send().await
            .map_err(|_| TransportError::Unreachable)?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        resp.json::<QuotaStatus>().await.map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_json, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    /// A port nothing listens on.
    async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn send_posts_history_and_session_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(
                body_json(
                    json!({
                    "history": [{ "role": "user", "content": "Catat Rp50000 makan" }],
                    "sessionId": "s1"
                })
                )
            )
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "Tercatat." })))
            .expect(1)
            .mount(&server).await;

        let transport = HttpTransport::new(server.uri());
        let reply = transport
            .send_message(&[Message::user("Catat Rp50000 makan")], "s1").await
            .unwrap();

        assert_eq!(reply, "Tercatat.");
    }

    #[tokio::test]
    async fn server_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "limit exceeded" }))
            )
            .mount(&server).await;

        let err = HttpTransport::new(server.uri())
            .send_message(&[Message::user("hi")], "s1").await
            .unwrap_err();

        assert!(matches!(err, TransportError::Api { status: 500, .. }));
        assert_eq!(err.to_string(), "limit exceeded");
    }

    #[tokio::test]
    async fn status_without_error_body_gets_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
            .mount(&server).await;

        let err = HttpTransport::new(server.uri())
            .send_message(&[Message::user("hi")], "s1").await
            .unwrap_err();

        assert_eq!(err.to_string(), "Request failed (503)");
    }

    #[tokio::test]
    async fn missing_server_is_reported_as_unreachable() {
        let err = HttpTransport::new(dead_url().await)
            .send_message(&[Message::user("hi")], "s1").await
            .unwrap_err();

        assert!(matches!(err, TransportError::Unreachable));
        assert_eq!(err.to_string(), UNREACHABLE_MESSAGE);
    }

    #[tokio::test]
    async fn missing_text_field_means_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server).await;

        let reply = HttpTransport::new(server.uri())
            .send_message(&[Message::user("hi")], "s1").await
            .unwrap();

        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn unparsable_success_body_is_a_generic_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server).await;

        let err = HttpTransport::new(server.uri())
            .send_message(&[Message::user("hi")], "s1").await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
        assert_eq!(err.to_string(), "Failed to get response from the assistant.");
    }

    #[tokio::test]
    async fn unparsable_quota_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quota"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server).await;

        let err = HttpTransport::new(server.uri()).fetch_quota().await.unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn load_history_filters_malformed_entries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/session/load"))
            .and(body_json(json!({ "sessionId": "s1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(
                    json!({
                    "history": [
                        { "role": "user", "content": "hi" },
                        { "role": "user" },
                        { "role": "assistant", "content": "halo" }
                    ]
                })
                )
            )
            .mount(&server).await;

        let history = HttpTransport::new(server.uri()).load_history("s1").await;

        assert_eq!(history, vec![Message::user("hi"), Message::assistant("halo")]);
    }

    #[tokio::test]
    async fn load_history_swallows_every_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server).await;
        assert!(HttpTransport::new(server.uri()).load_history("s1").await.is_empty());

        let garbled = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&garbled).await;
        assert!(HttpTransport::new(garbled.uri()).load_history("s1").await.is_empty());

        assert!(HttpTransport::new(dead_url().await).load_history("s1").await.is_empty());
    }

    #[tokio::test]
    async fn fetch_quota_parses_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quota"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "remaining": 7, "limit": 20 }))
            )
            .mount(&server).await;

        let quota = HttpTransport::new(server.uri()).fetch_quota().await.unwrap();

        assert_eq!(quota, QuotaStatus { remaining: 7, limit: 20 });
    }
}
