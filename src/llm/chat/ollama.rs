use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use async_trait::async_trait;
use super::{ ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmType };
use crate::models::chat::Message;
use log::debug;

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
    system_prompt: String,
}

#[derive(Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
}

impl OllamaClient {
    pub fn new(
        base_url: Option<String>,
        completion_model: Option<String>,
        system_prompt: String
    ) -> Self {
        let model = completion_model.unwrap_or_else(|| "llama3.1".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());

        Self {
            http: HttpClient::new(),
            base_url: url.trim_end_matches('/').to_string(),
            completion_model: model,
            system_prompt,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if config.llm_type != LlmType::Ollama {
            return Err("Invalid config type for OllamaClient".into());
        }

        Ok(
            Self::new(
                config.base_url.clone(),
                config.completion_model.clone(),
                config.system_prompt.clone()
            )
        )
    }

    fn build_messages(&self, history: &[Message]) -> Vec<OllamaMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: self.system_prompt.clone(),
            });
        }
        messages.extend(
            history.iter().map(|m| OllamaMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
        );
        messages
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(
        &self,
        history: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/api/chat", self.base_url);
        let req = ChatRequest {
            model: self.completion_model.clone(),
            messages: self.build_messages(history),
            stream: false,
        };
        debug!("OllamaClient::chat() → model={} turns={}", self.completion_model, history.len());
        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        let data = resp.json::<ChatResponse>().await?;
        Ok(CompletionResponse { response: data.message.content })
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
