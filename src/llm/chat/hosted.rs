use async_trait::async_trait;
use std::error::Error as StdError;
use log::debug;

use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmConfig;
use crate::models::chat::{ Message, Role };
use rllm::chat::{ ChatMessage, ChatRole, MessageType };
use rllm::builder::{ LLMBackend, LLMBuilder };
use rllm::LLMProvider;

/// Providers reached through the `rllm` builder (Gemini, Anthropic).
pub struct HostedChatClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    provider: &'static str,
    model: String,
    base_url: Option<String>,
}

fn describe(backend: &LLMBackend) -> (&'static str, &'static str) {
    match backend {
        LLMBackend::Google => ("gemini", "gemini-1.5-flash-latest"),
        LLMBackend::Anthropic => ("anthropic", "claude-3-5-haiku-latest"),
        _ => ("hosted", "default"),
    }
}

impl HostedChatClient {
    pub fn new(
        backend: LLMBackend,
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        system_prompt: &str
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let (provider, fallback_model) = describe(&backend);
        let chat_model = model.unwrap_or_else(|| fallback_model.to_string());

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .api_key(api_key)
            .model(&chat_model)
            .max_tokens(2048)
            .temperature(0.7)
            .stream(false);

        if !system_prompt.is_empty() {
            builder = builder.system(system_prompt);
        }
        if let Some(url) = &base_url {
            builder = builder.base_url(url);
        }

        let llm_provider = builder.build()?;

        Ok(Self {
            llm: llm_provider,
            provider,
            model: chat_model,
            base_url,
        })
    }

    pub fn from_config(
        config: &LlmConfig,
        backend: LLMBackend
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| format!("API key is required for {:?}", config.llm_type))?;

        Self::new(
            backend,
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            &config.system_prompt
        )
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    ChatMessage {
        role: match message.role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        },
        content: message.content.clone(),
        message_type: MessageType::Text,
    }
}

#[async_trait]
impl ChatClient for HostedChatClient {
    async fn chat(
        &self,
        history: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let messages: Vec<ChatMessage> = history.iter().map(to_chat_message).collect();
        debug!(
            "HostedChatClient::chat() → provider={} model={} base_url={:?}",
            self.provider,
            self.model,
            self.base_url
        );
        let resp = self.llm.chat(&messages).await?;
        let text = resp
            .text()
            .map(|s| s.to_string())
            .unwrap_or_else(|| resp.to_string());
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}
