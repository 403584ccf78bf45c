use serde::{ Deserialize, Serialize };
use super::chat::Message;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ChatReply {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionLoadRequest {
    pub session_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SessionHistory {
    pub history: Vec<Message>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    #[serde(default)]
    pub remaining: u32,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
