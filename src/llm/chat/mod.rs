pub mod hosted;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;
use super::{ LlmConfig, LlmType };
use crate::models::chat::Message;
use self::hosted::HostedChatClient;
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use rllm::builder::LLMBackend;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

/// Produces the next assistant turn for a conversation. The system prompt is fixed
/// when the client is built.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        history: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI | LlmType::DeepSeek | LlmType::XAI | LlmType::Groq => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Gemini => {
            let specific_client = HostedChatClient::from_config(config, LLMBackend::Google)?;
            Arc::new(specific_client)
        }
        LlmType::Anthropic => {
            let specific_client = HostedChatClient::from_config(config, LLMBackend::Anthropic)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
